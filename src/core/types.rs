use serde::Serialize;

use super::profile::InvestorProfile;
use crate::error::ProjectionError;

/// Monthly withdrawal rate applied to wealth at retirement when no income target is set.
pub const DEFAULT_MONTHLY_INCOME_RATE: f64 = 0.004;
pub const DEFAULT_LIFE_EXPECTANCY: u32 = 100;
pub const MAX_LIFE_EXPECTANCY: u32 = 120;
pub const DEFAULT_TRIALS: u32 = 1001;

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionInput {
    pub current_age: u32,
    pub accumulation_years: u32,
    pub life_expectancy: u32,
    pub initial_amount: f64,
    pub monthly_amount: f64,
    pub monthly_income_target: f64,
    /// Retirement-phase return in percent (4.0 = 4% a.a.).
    pub portfolio_return: f64,
    pub profile: InvestorProfile,
}

impl ProjectionInput {
    pub fn retirement_age(&self) -> u32 {
        self.current_age.saturating_add(self.accumulation_years)
    }

    pub fn drawdown_years(&self) -> u32 {
        self.life_expectancy.saturating_sub(self.retirement_age())
    }

    pub fn horizon_years(&self) -> u32 {
        self.accumulation_years.saturating_add(self.drawdown_years())
    }

    pub fn accumulation_rate(&self) -> f64 {
        self.profile.annual_return()
    }

    pub fn retirement_rate(&self) -> f64 {
        self.portfolio_return / 100.0
    }

    pub fn annual_withdrawal(&self, wealth_at_retirement: f64) -> f64 {
        if self.monthly_income_target > 0.0 {
            self.monthly_income_target * 12.0
        } else {
            wealth_at_retirement.max(0.0) * DEFAULT_MONTHLY_INCOME_RATE * 12.0
        }
    }

    pub fn validate(&self) -> Result<(), ProjectionError> {
        for (name, value) in [
            ("initialAmount", self.initial_amount),
            ("monthlyAmount", self.monthly_amount),
            ("monthlyIncomeTarget", self.monthly_income_target),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ProjectionError::InvalidInput(format!(
                    "{name} must be a finite value >= 0"
                )));
            }
        }
        if !self.portfolio_return.is_finite() || !(-100.0..=100.0).contains(&self.portfolio_return)
        {
            return Err(ProjectionError::InvalidInput(
                "portfolioReturn must be between -100 and 100".to_string(),
            ));
        }
        if self.life_expectancy > MAX_LIFE_EXPECTANCY {
            return Err(ProjectionError::InvalidInput(format!(
                "lifeExpectancy must be <= {MAX_LIFE_EXPECTANCY}"
            )));
        }
        if self.life_expectancy < self.retirement_age() {
            return Err(ProjectionError::InvalidInput(
                "lifeExpectancy must be >= currentAge + accumulationYears".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuccessCriterion {
    #[default]
    SolventAtHorizon,
    IncomeFullyFunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeBands {
    pub lower_percentile: f64,
    pub upper_percentile: f64,
}

impl Default for EnvelopeBands {
    fn default() -> Self {
        Self {
            lower_percentile: 5.0,
            upper_percentile: 95.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    pub trials: u32,
    pub envelope: EnvelopeBands,
    pub success_criterion: SuccessCriterion,
    pub retirement_volatility_factor: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            envelope: EnvelopeBands::default(),
            success_criterion: SuccessCriterion::default(),
            retirement_volatility_factor: 0.7,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ProjectionError> {
        if self.trials == 0 {
            return Err(ProjectionError::InvalidConfig("trials must be > 0".to_string()));
        }
        let EnvelopeBands {
            lower_percentile: lo,
            upper_percentile: hi,
        } = self.envelope;
        if !(0.0..=50.0).contains(&lo) || !(50.0..=100.0).contains(&hi) {
            return Err(ProjectionError::InvalidConfig(
                "envelope must satisfy 0 <= lower <= 50 <= upper <= 100".to_string(),
            ));
        }
        if !self.retirement_volatility_factor.is_finite() || self.retirement_volatility_factor < 0.0
        {
            return Err(ProjectionError::InvalidConfig(
                "retirement volatility factor must be >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenarios {
    pub pessimistic: Vec<f64>,
    pub median: Vec<f64>,
    pub optimistic: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub percentile25: Vec<f64>,
    pub percentile75: Vec<f64>,
    pub success_probability: f64,
    pub trials: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonteCarloResult {
    pub scenarios: Scenarios,
    pub statistics: Statistics,
}

impl MonteCarloResult {
    pub fn len(&self) -> usize {
        self.scenarios.median.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.median.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub trajectory: Vec<f64>,
    pub monte_carlo: Option<MonteCarloResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ProjectionInput {
        ProjectionInput {
            current_age: 30,
            accumulation_years: 35,
            life_expectancy: 100,
            initial_amount: 100_000.0,
            monthly_amount: 1_000.0,
            monthly_income_target: 0.0,
            portfolio_return: 4.0,
            profile: InvestorProfile::Moderate,
        }
    }

    #[test]
    fn horizon_splits_into_accumulation_and_drawdown() {
        let i = input();
        assert_eq!(i.retirement_age(), 65);
        assert_eq!(i.drawdown_years(), 35);
        assert_eq!(i.horizon_years(), 70);
    }

    #[test]
    fn withdrawal_defaults_to_share_of_retirement_wealth() {
        let mut i = input();
        assert!((i.annual_withdrawal(1_000_000.0) - 48_000.0).abs() < 1e-9);
        i.monthly_income_target = 5_000.0;
        assert!((i.annual_withdrawal(1_000_000.0) - 60_000.0).abs() < 1e-9);
    }

    #[test]
    fn validate_rejects_negative_amounts_and_short_life() {
        let mut i = input();
        i.monthly_amount = -1.0;
        assert!(i.validate().is_err());

        let mut i = input();
        i.life_expectancy = 60;
        assert!(i.validate().is_err());

        assert!(input().validate().is_ok());
    }

    #[test]
    fn validate_caps_the_horizon() {
        let mut i = input();
        i.life_expectancy = MAX_LIFE_EXPECTANCY;
        assert!(i.validate().is_ok());

        i.life_expectancy = 400_000_000;
        assert!(i.validate().is_err());

        let mut i = input();
        i.current_age = u32::MAX - 10;
        assert_eq!(i.retirement_age(), u32::MAX);
        assert!(i.validate().is_err());
    }

    #[test]
    fn config_rejects_inverted_envelope() {
        let mut c = SimulationConfig::default();
        c.envelope.lower_percentile = 60.0;
        assert!(c.validate().is_err());

        let mut c = SimulationConfig::default();
        c.trials = 0;
        assert!(c.validate().is_err());

        assert!(SimulationConfig::default().validate().is_ok());
    }
}
