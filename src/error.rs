use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid simulation config: {0}")]
    InvalidConfig(String),

    #[error("unknown investor profile: {0}")]
    UnknownProfile(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnimationError {
    #[error("line count must be > 0")]
    NoLines,

    #[error("{name} must be a finite, non-negative duration (got {value})")]
    InvalidDuration { name: &'static str, value: f64 },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv buffer flush failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv output is not valid utf-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

pub(crate) fn check_duration(name: &'static str, value: f64) -> Result<f64, AnimationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(AnimationError::InvalidDuration { name, value })
    }
}
