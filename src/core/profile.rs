use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProjectionError;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum InvestorProfile {
    #[serde(rename = "conservador", alias = "conservative")]
    Conservative,
    #[default]
    #[serde(rename = "moderado", alias = "moderate")]
    Moderate,
    #[serde(rename = "arrojado", alias = "aggressive")]
    Aggressive,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileParams {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    /// Expected annual return as a fraction (0.055 = 5.5% a.a.).
    pub annual_return: f64,
    /// Annual volatility in percent.
    pub volatility: f64,
    pub max_loss: f64,
}

const CONSERVATIVE: ProfileParams = ProfileParams {
    id: "conservador",
    title: "Conservador",
    description: "Investidor com pouca tolerância ao risco, busca segurança e menor volatilidade.",
    annual_return: 0.04,
    volatility: 1.0,
    max_loss: -5.0,
};

const MODERATE: ProfileParams = ProfileParams {
    id: "moderado",
    title: "Moderado",
    description: "Investidor que equilibra segurança e risco, está disposto a enfrentar alguma volatilidade.",
    annual_return: 0.055,
    volatility: 5.5,
    max_loss: -15.0,
};

const AGGRESSIVE: ProfileParams = ProfileParams {
    id: "arrojado",
    title: "Arrojado",
    description: "Investidor mais tolerante ao risco, disposto a assumir mais volatilidade em busca de maiores retornos.",
    annual_return: 0.065,
    volatility: 9.0,
    max_loss: -25.0,
};

impl InvestorProfile {
    pub const ALL: [InvestorProfile; 3] = [
        InvestorProfile::Conservative,
        InvestorProfile::Moderate,
        InvestorProfile::Aggressive,
    ];

    pub fn params(self) -> &'static ProfileParams {
        match self {
            InvestorProfile::Conservative => &CONSERVATIVE,
            InvestorProfile::Moderate => &MODERATE,
            InvestorProfile::Aggressive => &AGGRESSIVE,
        }
    }

    pub fn annual_return(self) -> f64 {
        self.params().annual_return
    }

    pub fn volatility(self) -> f64 {
        self.params().volatility / 100.0
    }
}

impl fmt::Display for InvestorProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.params().id)
    }
}

impl FromStr for InvestorProfile {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservador" | "conservative" => Ok(InvestorProfile::Conservative),
            "moderado" | "moderate" => Ok(InvestorProfile::Moderate),
            "arrojado" | "aggressive" => Ok(InvestorProfile::Aggressive),
            other => Err(ProjectionError::UnknownProfile(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_increase_with_risk() {
        let returns = InvestorProfile::ALL.map(InvestorProfile::annual_return);
        assert!(returns[0] < returns[1] && returns[1] < returns[2]);

        let vols = InvestorProfile::ALL.map(InvestorProfile::volatility);
        assert!(vols[0] < vols[1] && vols[1] < vols[2]);
    }

    #[test]
    fn moderate_matches_reference_parameters() {
        let p = InvestorProfile::Moderate.params();
        assert_eq!(p.id, "moderado");
        assert_eq!(p.annual_return, 0.055);
        assert!((InvestorProfile::Moderate.volatility() - 0.055).abs() < 1e-12);
    }

    #[test]
    fn parses_wire_ids_and_english_aliases() {
        assert_eq!(
            "arrojado".parse::<InvestorProfile>(),
            Ok(InvestorProfile::Aggressive)
        );
        assert_eq!(
            "Conservative".parse::<InvestorProfile>(),
            Ok(InvestorProfile::Conservative)
        );
        assert!("yolo".parse::<InvestorProfile>().is_err());

        let p: InvestorProfile = serde_json::from_str("\"moderate\"").expect("alias");
        assert_eq!(p, InvestorProfile::Moderate);
        assert_eq!(
            serde_json::to_string(&InvestorProfile::Moderate).expect("serialize"),
            "\"moderado\""
        );
    }
}
