use thiserror::Error;

//input validation failures; any of these aborts the whole run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{series} series is empty")]
    EmptySeries { series: &'static str },

    #[error("missing required field '{field}' at bar {index}")]
    MissingField { field: &'static str, index: usize },

    #[error("invalid value for '{field}' at bar {index}: {reason}")]
    InvalidField {
        field: &'static str,
        index: usize,
        reason: String,
    },

    #[error("misaligned input: {bars} bars but {actions} actions")]
    Misaligned { bars: usize, actions: usize },

    #[error("timestamps not strictly increasing at bar {index}")]
    NonMonotonic { index: usize },

    #[error("invalid configuration '{field}': {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}
