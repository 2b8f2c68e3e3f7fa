use tracing::{debug, info};

use super::random::RandomSource;
use super::types::{
    MonteCarloResult, Projection, ProjectionInput, Scenarios, SimulationConfig, Statistics,
    SuccessCriterion,
};
use crate::error::ProjectionError;

const MIN_ANNUAL_RETURN: f64 = -0.95;
const MAX_ANNUAL_RETURN: f64 = 2.5;

#[derive(Debug, Clone, Copy)]
struct TrialOutcome {
    terminal: f64,
    fully_funded: bool,
}

#[derive(Debug, Clone, Copy)]
struct PhaseParams {
    mean: f64,
    vol: f64,
}

/// Runs the deterministic projection and, when enabled, the Monte Carlo
/// simulation. The result is assembled whole before it is returned.
pub fn project(
    input: &ProjectionInput,
    config: &SimulationConfig,
    monte_carlo_enabled: bool,
    rng: &mut dyn RandomSource,
) -> Result<Projection, ProjectionError> {
    input.validate()?;
    let trajectory = deterministic_trajectory(input);
    let monte_carlo = if monte_carlo_enabled {
        config.validate()?;
        Some(run_monte_carlo(input, config, rng))
    } else {
        None
    };
    Ok(Projection {
        trajectory,
        monte_carlo,
    })
}

pub fn deterministic_trajectory(input: &ProjectionInput) -> Vec<f64> {
    let mut trajectory = Vec::with_capacity(input.horizon_years() as usize + 1);
    let mut balance = input.initial_amount.max(0.0);
    trajectory.push(balance);

    let rate = input.accumulation_rate();
    for _ in 0..input.accumulation_years {
        balance = accumulate_year(balance, rate, input.monthly_amount);
        trajectory.push(balance);
    }

    let withdrawal = input.annual_withdrawal(balance);
    let rate = input.retirement_rate();
    for _ in 0..input.drawdown_years() {
        balance = drawdown_year(balance, rate, withdrawal);
        trajectory.push(balance);
    }

    trajectory
}

pub fn run_monte_carlo(
    input: &ProjectionInput,
    config: &SimulationConfig,
    rng: &mut dyn RandomSource,
) -> MonteCarloResult {
    let year_count = input.horizon_years() as usize + 1;
    let trials = config.trials.max(1);
    info!(
        trials,
        years = year_count,
        profile = %input.profile,
        "starting monte carlo projection"
    );

    let accumulation = PhaseParams {
        mean: input.accumulation_rate(),
        vol: input.profile.volatility(),
    };
    let retirement = PhaseParams {
        mean: input.retirement_rate(),
        vol: input.profile.volatility() * config.retirement_volatility_factor,
    };

    let mut samples = YearlySamples::new(year_count, trials as usize);
    let mut path = Vec::with_capacity(year_count);
    let mut successes = 0_u32;

    for _ in 0..trials {
        path.clear();
        let outcome = simulate_trial(input, accumulation, retirement, rng, &mut path);
        let success = match config.success_criterion {
            SuccessCriterion::SolventAtHorizon => outcome.terminal > 0.0,
            SuccessCriterion::IncomeFullyFunded => outcome.fully_funded,
        };
        if success {
            successes += 1;
        }
        samples.push_path(&path);
    }

    let success_probability = (successes as f64 / trials as f64).clamp(0.0, 1.0);
    let result = samples.into_result(config, success_probability, trials);
    info!(
        success_probability,
        median_terminal = result.scenarios.median.last().copied().unwrap_or(0.0),
        "monte carlo projection finished"
    );
    result
}

fn simulate_trial(
    input: &ProjectionInput,
    accumulation: PhaseParams,
    retirement: PhaseParams,
    rng: &mut dyn RandomSource,
    path: &mut Vec<f64>,
) -> TrialOutcome {
    let mut balance = input.initial_amount.max(0.0);
    path.push(balance);

    for _ in 0..input.accumulation_years {
        let r = sample_return(accumulation, rng);
        balance = accumulate_year(balance, r, input.monthly_amount);
        path.push(balance);
    }

    let withdrawal = input.annual_withdrawal(balance);
    let mut fully_funded = true;
    for _ in 0..input.drawdown_years() {
        if balance < withdrawal {
            fully_funded = false;
        }
        let r = sample_return(retirement, rng);
        balance = drawdown_year(balance, r, withdrawal);
        path.push(balance);
    }

    TrialOutcome {
        terminal: balance,
        fully_funded,
    }
}

fn accumulate_year(balance: f64, rate: f64, monthly_amount: f64) -> f64 {
    (balance * (1.0 + rate) + monthly_amount * 12.0).max(0.0)
}

fn drawdown_year(balance: f64, rate: f64, withdrawal: f64) -> f64 {
    let remaining = (balance - withdrawal).max(0.0);
    (remaining * (1.0 + rate)).max(0.0)
}

fn sample_return(params: PhaseParams, rng: &mut dyn RandomSource) -> f64 {
    if params.vol <= 0.0 {
        return params.mean.clamp(MIN_ANNUAL_RETURN, MAX_ANNUAL_RETURN);
    }
    let z = rng.standard_normal();
    (params.mean + params.vol * z).clamp(MIN_ANNUAL_RETURN, MAX_ANNUAL_RETURN)
}

struct YearlySamples {
    years: Vec<Vec<f64>>,
}

impl YearlySamples {
    fn new(year_count: usize, expected_trials: usize) -> Self {
        Self {
            years: (0..year_count)
                .map(|_| Vec::with_capacity(expected_trials))
                .collect(),
        }
    }

    fn push_path(&mut self, path: &[f64]) {
        for (idx, column) in self.years.iter_mut().enumerate() {
            column.push(path.get(idx).copied().unwrap_or(0.0));
        }
    }

    fn into_result(
        self,
        config: &SimulationConfig,
        success_probability: f64,
        trials: u32,
    ) -> MonteCarloResult {
        let n = self.years.len();
        let mut pessimistic = Vec::with_capacity(n);
        let mut median = Vec::with_capacity(n);
        let mut optimistic = Vec::with_capacity(n);
        let mut percentile25 = Vec::with_capacity(n);
        let mut percentile75 = Vec::with_capacity(n);

        for mut column in self.years {
            column.sort_by(|a, b| a.total_cmp(b));
            let mid = percentile_sorted(&column, 50.0);
            let (lo, hi) = ordered_band(
                percentile_sorted(&column, config.envelope.lower_percentile),
                mid,
                percentile_sorted(&column, config.envelope.upper_percentile),
            );
            let (p25, p75) = ordered_band(
                percentile_sorted(&column, 25.0),
                mid,
                percentile_sorted(&column, 75.0),
            );
            pessimistic.push(lo);
            median.push(mid);
            optimistic.push(hi);
            percentile25.push(p25);
            percentile75.push(p75);
        }
        debug!(years = n, "percentile bands extracted");

        MonteCarloResult {
            scenarios: Scenarios {
                pessimistic,
                median,
                optimistic,
            },
            statistics: Statistics {
                percentile25,
                percentile75,
                success_probability,
                trials,
            },
        }
    }
}

fn ordered_band(lower: f64, mid: f64, upper: f64) -> (f64, f64) {
    (lower.min(mid), upper.max(mid))
}

/// Linear interpolation between closest ranks; `values` must be sorted.
fn percentile_sorted(values: &[f64], p: f64) -> f64 {
    match values.len() {
        0 => return 0.0,
        1 => return values[0],
        _ => {}
    }

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (values.len() as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        values[lower]
    } else {
        let w = rank - lower as f64;
        values[lower] + (values[upper] - values[lower]) * w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::profile::InvestorProfile;
    use crate::core::random::SeededRng;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_input() -> ProjectionInput {
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

    fn config(trials: u32) -> SimulationConfig {
        SimulationConfig {
            trials,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn deterministic_scenario_starts_at_initial_amount_and_grows() {
        let input = sample_input();
        let mut rng = SeededRng::new(1);
        let projection = project(&input, &config(10), false, &mut rng).expect("valid input");

        let t = &projection.trajectory;
        assert_eq!(t.len(), 71);
        assert_eq!(t[0], 100_000.0);
        for i in 1..=35 {
            assert!(t[i] > t[i - 1], "year {i} did not grow");
        }
        assert!(t.iter().all(|v| *v >= 0.0));
        assert!(projection.monte_carlo.is_none());
    }

    #[test]
    fn accumulation_only_horizon_has_36_points() {
        let mut input = sample_input();
        input.life_expectancy = 65;
        let t = deterministic_trajectory(&input);
        assert_eq!(t.len(), 36);
        assert_eq!(t[0], 100_000.0);
    }

    #[test]
    fn oracle_compound_path_matches_hand_calculation() {
        let input = ProjectionInput {
            current_age: 30,
            accumulation_years: 2,
            life_expectancy: 34,
            initial_amount: 100.0,
            monthly_amount: 1.0,
            monthly_income_target: 5.0,
            portfolio_return: 10.0,
            profile: InvestorProfile::Moderate,
        };

        // Accumulation at 5.5%: 100*1.055+12 = 117.5; 117.5*1.055+12 = 135.9625
        // Drawdown of 60/yr at 10%: (135.9625-60)*1.1 = 83.55875; (83.55875-60)*1.1 = 25.914625
        let t = deterministic_trajectory(&input);
        assert_eq!(t.len(), 5);
        assert_approx(t[1], 117.5);
        assert_approx(t[2], 135.9625);
        assert_approx(t[3], 83.55875);
        assert_approx(t[4], 25.914625);
    }

    #[test]
    fn drawdown_floors_at_zero() {
        let mut input = sample_input();
        input.monthly_income_target = 50_000.0;
        let t = deterministic_trajectory(&input);
        assert_eq!(*t.last().expect("non-empty"), 0.0);
        assert!(t.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn zero_portfolio_return_still_projects() {
        let mut input = sample_input();
        input.portfolio_return = 0.0;
        input.monthly_income_target = 1_000.0;
        let t = deterministic_trajectory(&input);
        let at_retirement = t[35];
        assert_approx(t[36], at_retirement - 12_000.0);
    }

    #[test]
    fn monte_carlo_scenario_bands_are_ordered() {
        let input = sample_input();
        let mut rng = SeededRng::new(42);
        let projection = project(&input, &config(1000), true, &mut rng).expect("valid input");
        let mc = projection.monte_carlo.expect("monte carlo enabled");

        assert_eq!(mc.len(), projection.trajectory.len());
        assert_eq!(mc.statistics.trials, 1000);
        for i in 0..mc.len() {
            assert!(mc.scenarios.pessimistic[i] <= mc.scenarios.median[i]);
            assert!(mc.scenarios.median[i] <= mc.scenarios.optimistic[i]);
            assert!(mc.statistics.percentile25[i] <= mc.statistics.percentile75[i]);
        }
        assert!((0.0..=1.0).contains(&mc.statistics.success_probability));
        assert_eq!(mc.scenarios.median[0], 100_000.0);
    }

    #[test]
    fn envelope_is_wider_than_interquartile_band() {
        let input = sample_input();
        let mut rng = SeededRng::new(9);
        let mc = run_monte_carlo(&input, &config(500), &mut rng);
        let year = input.accumulation_years as usize;
        assert!(mc.scenarios.pessimistic[year] < mc.statistics.percentile25[year]);
        assert!(mc.scenarios.optimistic[year] > mc.statistics.percentile75[year]);
    }

    #[test]
    fn envelope_can_coincide_with_quartiles() {
        let input = sample_input();
        let mut cfg = config(300);
        cfg.envelope.lower_percentile = 25.0;
        cfg.envelope.upper_percentile = 75.0;
        let mut rng = SeededRng::new(3);
        let mc = run_monte_carlo(&input, &cfg, &mut rng);
        assert_eq!(mc.scenarios.pessimistic, mc.statistics.percentile25);
        assert_eq!(mc.scenarios.optimistic, mc.statistics.percentile75);
    }

    #[test]
    fn fixed_seed_reruns_are_identical() {
        let input = sample_input();
        let a = run_monte_carlo(&input, &config(200), &mut SeededRng::new(123));
        let b = run_monte_carlo(&input, &config(200), &mut SeededRng::new(123));
        assert_eq!(a, b);
    }

    #[test]
    fn income_target_criterion_is_stricter_than_solvency() {
        let mut input = sample_input();
        input.monthly_income_target = 9_000.0;
        let mut solvent = config(400);
        solvent.success_criterion = SuccessCriterion::SolventAtHorizon;
        let mut funded = solvent;
        funded.success_criterion = SuccessCriterion::IncomeFullyFunded;

        let a = run_monte_carlo(&input, &solvent, &mut SeededRng::new(5));
        let b = run_monte_carlo(&input, &funded, &mut SeededRng::new(5));
        assert!(b.statistics.success_probability <= a.statistics.success_probability);
    }

    #[test]
    fn generous_income_target_fails_every_trial() {
        let mut input = sample_input();
        input.monthly_income_target = 1_000_000.0;
        let mc = run_monte_carlo(&input, &config(100), &mut SeededRng::new(8));
        assert_eq!(mc.statistics.success_probability, 0.0);
        assert_eq!(*mc.scenarios.optimistic.last().expect("non-empty"), 0.0);
    }

    #[test]
    fn invalid_config_is_rejected_only_when_simulating() {
        let input = sample_input();
        let bad = config(0);
        let mut rng = SeededRng::new(1);
        assert!(project(&input, &bad, false, &mut rng).is_ok());
        assert!(matches!(
            project(&input, &bad, true, &mut rng),
            Err(ProjectionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn percentile_interpolates_between_points() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_approx(percentile_sorted(&values, 25.0), 1.75);
        assert_approx(percentile_sorted(&values, 0.0), 1.0);
        assert_approx(percentile_sorted(&values, 100.0), 4.0);
        assert_eq!(percentile_sorted(&[], 50.0), 0.0);
    }

    #[test]
    fn sample_return_clamps_extremes() {
        let mut rng = SeededRng::new(1);
        let r = sample_return(PhaseParams { mean: -3.0, vol: 0.0 }, &mut rng);
        assert_approx(r, MIN_ANNUAL_RETURN);
        let r = sample_return(PhaseParams { mean: 4.0, vol: 0.0 }, &mut rng);
        assert_approx(r, MAX_ANNUAL_RETURN);
    }

    proptest! {
        #[test]
        fn trajectory_invariants_hold(
            initial in 0.0f64..2_000_000.0,
            monthly in 0.0f64..20_000.0,
            income in 0.0f64..50_000.0,
            portfolio_return in -5.0f64..15.0,
            current_age in 18u32..70,
            accumulation in 0u32..40,
            extra_life in 0u32..40,
        ) {
            let input = ProjectionInput {
                current_age,
                accumulation_years: accumulation,
                life_expectancy: current_age + accumulation + extra_life,
                initial_amount: initial,
                monthly_amount: monthly,
                monthly_income_target: income,
                portfolio_return,
                profile: InvestorProfile::Aggressive,
            };
            let t = deterministic_trajectory(&input);
            prop_assert_eq!(t.len(), (accumulation + extra_life) as usize + 1);
            prop_assert_eq!(t[0], initial);
            prop_assert!(t.iter().all(|v| *v >= 0.0));
            for i in 1..=accumulation as usize {
                prop_assert!(t[i] >= t[i - 1]);
            }
        }

        #[test]
        fn monte_carlo_invariants_hold(
            seed in proptest::prelude::any::<u64>(),
            trials in 1u32..60,
            income in 0.0f64..20_000.0,
            lower in 0.0f64..50.0,
            upper in 50.0f64..100.0,
        ) {
            let mut input = sample_input();
            input.monthly_income_target = income;
            input.life_expectancy = 80;
            let cfg = SimulationConfig {
                trials,
                envelope: crate::core::types::EnvelopeBands {
                    lower_percentile: lower,
                    upper_percentile: upper,
                },
                ..SimulationConfig::default()
            };
            let mc = run_monte_carlo(&input, &cfg, &mut SeededRng::new(seed));
            prop_assert!((0.0..=1.0).contains(&mc.statistics.success_probability));
            for i in 0..mc.len() {
                prop_assert!(mc.scenarios.pessimistic[i] <= mc.scenarios.median[i]);
                prop_assert!(mc.scenarios.median[i] <= mc.scenarios.optimistic[i]);
                prop_assert!(mc.statistics.percentile25[i] <= mc.statistics.percentile75[i]);
                prop_assert!(mc.scenarios.pessimistic[i] >= 0.0);
            }
        }
    }
}
