use serde::Serialize;

use super::types::ProjectionInput;

const MIN_SEARCH_RETURN: f64 = 0.001;
const MAX_SEARCH_RETURN: f64 = 0.5;
const SEARCH_TOLERANCE: f64 = 1.0;
const MAX_SEARCH_ITERATIONS: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub accumulated_wealth: f64,
    pub required_wealth_perpetuity: Option<f64>,
    pub required_wealth_depleting: f64,
    pub possible_retirement_age: u32,
    pub sustainable_monthly_income: f64,
    pub depleting_monthly_income: f64,
    pub suggested_monthly_contribution: f64,
    pub minimum_accumulation_return: f64,
}

impl Insights {
    pub fn from_input(input: &ProjectionInput, trajectory: &[f64]) -> Self {
        let drawdown_years = input.drawdown_years();
        let accumulated = accumulated_wealth(
            input.initial_amount,
            input.monthly_amount,
            input.accumulation_years,
            input.accumulation_rate(),
        );
        Self {
            accumulated_wealth: accumulated,
            required_wealth_perpetuity: perpetuity_wealth(
                input.monthly_income_target,
                input.portfolio_return,
            ),
            required_wealth_depleting: required_wealth_depleting(
                input.monthly_income_target,
                drawdown_years,
                input.retirement_rate(),
            ),
            possible_retirement_age: possible_retirement_age(input, trajectory),
            sustainable_monthly_income: sustainable_monthly_income(
                accumulated,
                input.portfolio_return,
            ),
            depleting_monthly_income: depleting_monthly_income(
                accumulated,
                drawdown_years,
                input.retirement_rate(),
            ),
            suggested_monthly_contribution: suggested_monthly_contribution(input),
            minimum_accumulation_return: minimum_accumulation_return(input),
        }
    }
}

fn monthly_rate(annual_return: f64) -> f64 {
    (1.0 + annual_return).powf(1.0 / 12.0) - 1.0
}

fn months_in(years: u32) -> u32 {
    years.saturating_mul(12)
}

pub fn perpetuity_wealth(monthly_income: f64, portfolio_return_pct: f64) -> Option<f64> {
    if monthly_income <= 0.0 || portfolio_return_pct <= 0.0 {
        return None;
    }
    Some((monthly_income * 12.0) / (portfolio_return_pct / 100.0))
}

pub fn sustainable_monthly_income(wealth: f64, portfolio_return_pct: f64) -> f64 {
    (wealth * (portfolio_return_pct / 100.0) / 12.0).max(0.0)
}

pub fn depleting_monthly_income(wealth: f64, years: u32, annual_return: f64) -> f64 {
    let months = months_in(years);
    if months == 0 {
        return 0.0;
    }
    let m = monthly_rate(annual_return);
    if m == 0.0 {
        return wealth / f64::from(months);
    }
    wealth * (m / (1.0 - (1.0 + m).powf(-f64::from(months))))
}

pub fn required_wealth_depleting(monthly_income: f64, years: u32, annual_return: f64) -> f64 {
    if monthly_income <= 0.0 {
        return 0.0;
    }
    let months = months_in(years);
    let m = monthly_rate(annual_return);
    if m == 0.0 {
        return monthly_income * f64::from(months);
    }
    monthly_income * ((1.0 - (1.0 + m).powf(-f64::from(months))) / m)
}

pub fn accumulated_wealth(
    initial_amount: f64,
    monthly_amount: f64,
    years: u32,
    annual_return: f64,
) -> f64 {
    let m = monthly_rate(annual_return);
    let mut balance = initial_amount;
    for _ in 0..months_in(years) {
        balance = (balance + monthly_amount) * (1.0 + m);
    }
    balance
}

/// First age whose projected wealth covers perpetuity wealth, else the
/// planned retirement age.
pub fn possible_retirement_age(input: &ProjectionInput, trajectory: &[f64]) -> u32 {
    let Some(required) = perpetuity_wealth(input.monthly_income_target, input.portfolio_return)
    else {
        return input.retirement_age();
    };

    trajectory
        .iter()
        .position(|&wealth| wealth >= required)
        .and_then(|year| u32::try_from(year).ok())
        .map_or(input.retirement_age(), |year| {
            input.current_age.saturating_add(year)
        })
}

pub fn suggested_monthly_contribution(input: &ProjectionInput) -> f64 {
    let required = required_wealth_depleting(
        input.monthly_income_target,
        input.drawdown_years(),
        input.retirement_rate(),
    );
    if required <= 0.0 {
        return 0.0;
    }

    let months = months_in(input.accumulation_years);
    if months == 0 {
        return 0.0;
    }
    let m = monthly_rate(input.accumulation_rate());
    let growth = (1.0 + m).powf(f64::from(months));
    let remaining = required - input.initial_amount * growth;
    if remaining <= 0.0 {
        return 0.0;
    }
    if m == 0.0 {
        return remaining / f64::from(months);
    }
    // Annuity-due factor, matching `accumulated_wealth`.
    let factor = (growth - 1.0) / m * (1.0 + m);
    (remaining / factor).max(0.0)
}

/// Lowest accumulation return (percent) whose compounded contributions reach
/// the depleting-wealth target. Bisection over 0.1%..50% a.a.
pub fn minimum_accumulation_return(input: &ProjectionInput) -> f64 {
    if input.monthly_income_target <= 0.0 {
        return input.accumulation_rate() * 100.0;
    }
    let required = required_wealth_depleting(
        input.monthly_income_target,
        input.drawdown_years(),
        input.retirement_rate(),
    );

    let mut lo = MIN_SEARCH_RETURN;
    let mut hi = MAX_SEARCH_RETURN;
    for _ in 0..MAX_SEARCH_ITERATIONS {
        let mid = (lo + hi) * 0.5;
        let balance = accumulated_wealth(
            input.initial_amount,
            input.monthly_amount,
            input.accumulation_years,
            mid,
        );
        if (balance - required).abs() < SEARCH_TOLERANCE {
            return mid * 100.0;
        }
        if balance < required {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    ((lo + hi) * 0.5) * 100.0
}
