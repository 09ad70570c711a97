use dom::DomError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PagerError {
    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("Dimension error: {0}")]
    Dimension(#[from] DimensionError),

    #[error("Invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Internal invariant failure while slicing; never caused by input alone
    #[error("Slice coverage violation: {0}")]
    SliceCoverage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-node failure to read a width or height; recovered by the pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DimensionError {
    #[error("cannot parse dimension {0:?}")]
    Invalid(String),

    #[error("unsupported unit {unit:?} in {value:?}")]
    UnsupportedUnit { value: String, unit: String },
}

/// Result type for pagination
pub type Result<T> = std::result::Result<T, PagerError>;
