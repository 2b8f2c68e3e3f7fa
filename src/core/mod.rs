mod engine;
mod insights;
mod profile;
mod random;
mod types;

pub use engine::{deterministic_trajectory, project, run_monte_carlo};
pub use insights::{
    Insights, accumulated_wealth, depleting_monthly_income, minimum_accumulation_return,
    perpetuity_wealth, possible_retirement_age, required_wealth_depleting,
    suggested_monthly_contribution, sustainable_monthly_income,
};
pub use profile::{InvestorProfile, ProfileParams};
pub use random::{EntropyRng, RandomSource, SeededRng};
pub use types::{
    DEFAULT_LIFE_EXPECTANCY, DEFAULT_MONTHLY_INCOME_RATE, DEFAULT_TRIALS, EnvelopeBands,
    MAX_LIFE_EXPECTANCY, MonteCarloResult, Projection, ProjectionInput, Scenarios,
    SimulationConfig, Statistics, SuccessCriterion,
};
