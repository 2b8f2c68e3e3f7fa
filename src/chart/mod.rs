mod export;
mod records;

pub use export::{export_csv, sanitize_csv_value};
pub use records::{
    ChartData, ChartRecord, DEFAULT_SAMPLE_LINES, MonteCarloPoint, Phase, build_chart,
    sample_paths, savings_line,
};
