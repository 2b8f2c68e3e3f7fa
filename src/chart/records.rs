use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::core::{MonteCarloResult, Projection, ProjectionInput, RandomSource};

pub const DEFAULT_SAMPLE_LINES: usize = 50;

const SAMPLE_NOISE_SCALE: f64 = 0.05;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Phase {
    #[serde(rename = "Acumulação")]
    Accumulation,
    #[serde(rename = "Aposentadoria")]
    Retirement,
}

impl Phase {
    pub fn for_age(age: u32, retirement_age: u32) -> Self {
        if age < retirement_age {
            Phase::Accumulation
        } else {
            Phase::Retirement
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Accumulation => "Acumulação",
            Phase::Retirement => "Aposentadoria",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloPoint {
    pub pessimistic: f64,
    pub median: f64,
    pub optimistic: f64,
    pub percentile25: f64,
    pub percentile75: f64,
    pub lines: Vec<f64>,
}

impl Serialize for MonteCarloPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5 + self.lines.len()))?;
        map.serialize_entry("pessimistic", &self.pessimistic)?;
        map.serialize_entry("median", &self.median)?;
        map.serialize_entry("optimistic", &self.optimistic)?;
        map.serialize_entry("percentile25", &self.percentile25)?;
        map.serialize_entry("percentile75", &self.percentile75)?;
        for (idx, value) in self.lines.iter().enumerate() {
            map.serialize_entry(&format!("line{idx}"), value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRecord {
    pub age: u32,
    pub patrimonio: f64,
    pub poupanca: f64,
    pub fase: Phase,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub monte_carlo: Option<MonteCarloPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub records: Vec<ChartRecord>,
    pub savings_line: Vec<f64>,
}

pub fn savings_line(input: &ProjectionInput, trajectory: &[f64]) -> Vec<f64> {
    if trajectory.is_empty() {
        return Vec::new();
    }

    let retirement_age = input.retirement_age();
    let wealth_at_retirement = trajectory
        .get(input.accumulation_years as usize)
        .copied()
        .unwrap_or(0.0);
    let withdrawal = input.annual_withdrawal(wealth_at_retirement);

    let mut total = input.initial_amount;
    let mut line = Vec::with_capacity(trajectory.len());
    line.push(total);
    for year in 1..trajectory.len() as u32 {
        if input.current_age + year <= retirement_age {
            total += input.monthly_amount * 12.0;
        } else {
            total -= withdrawal;
        }
        line.push(total.max(0.0));
    }
    line
}

/// Decorative paths spread across the envelope. Cosmetic only; nothing here
/// feeds back into the statistics.
pub fn sample_paths(
    mc: &MonteCarloResult,
    count: usize,
    rng: &mut dyn RandomSource,
) -> Vec<Vec<f64>> {
    let scenarios = &mc.scenarios;
    (0..count)
        .map(|k| {
            let t = if count > 1 {
                k as f64 / (count - 1) as f64
            } else {
                0.5
            };
            let u = 2.0 * t - 1.0;
            let skew = u * u;

            scenarios
                .median
                .iter()
                .enumerate()
                .map(|(year, &median)| {
                    let pessimistic = scenarios.pessimistic.get(year).copied().unwrap_or(median);
                    let optimistic = scenarios.optimistic.get(year).copied().unwrap_or(median);
                    let base = if u >= 0.0 {
                        median + (optimistic - median) * skew
                    } else {
                        median - (median - pessimistic) * skew
                    };
                    let noise = if year == 0 {
                        0.0
                    } else {
                        (rng.next_f64() - 0.5) * SAMPLE_NOISE_SCALE * base
                    };
                    (base + noise).max(0.0)
                })
                .collect()
        })
        .collect()
}

pub fn build_chart(
    input: &ProjectionInput,
    projection: &Projection,
    line_count: usize,
    rng: &mut dyn RandomSource,
) -> ChartData {
    let savings = savings_line(input, &projection.trajectory);
    let paths = match &projection.monte_carlo {
        Some(mc) => sample_paths(mc, line_count, rng),
        None => Vec::new(),
    };
    let retirement_age = input.retirement_age();

    let records = projection
        .trajectory
        .iter()
        .enumerate()
        .map(|(idx, &value)| {
            let age = input.current_age + idx as u32;
            let monte_carlo = projection
                .monte_carlo
                .as_ref()
                .filter(|mc| idx < mc.len())
                .map(|mc| MonteCarloPoint {
                    pessimistic: mc.scenarios.pessimistic[idx],
                    median: mc.scenarios.median[idx],
                    optimistic: mc.scenarios.optimistic[idx],
                    percentile25: mc.statistics.percentile25[idx],
                    percentile75: mc.statistics.percentile75[idx],
                    lines: paths
                        .iter()
                        .filter_map(|line| line.get(idx).copied())
                        .collect(),
                });
            ChartRecord {
                age,
                patrimonio: value,
                poupanca: savings.get(idx).copied().unwrap_or(0.0),
                fase: Phase::for_age(age, retirement_age),
                monte_carlo,
            }
        })
        .collect::<Vec<_>>();

    debug!(
        records = records.len(),
        sample_lines = paths.len(),
        "chart records built"
    );

    ChartData {
        records,
        savings_line: savings,
    }
}
