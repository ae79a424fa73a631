use thiserror::Error;

/// Errors raised by the simulation engine.
///
/// Everything except [`SimError::Cancelled`] is a validation failure that is
/// reported before any replicate state exists.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// A run was requested with zero replicates.
    #[error("number of replicates must be at least 1")]
    NoReplicates,

    /// A required collection was empty.
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    /// Two inputs disagree on a dimension.
    #[error("dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    /// A parameter value is outside its valid range.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A configuration document could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    /// A worker observed a cancellation request; no output was produced.
    #[error("simulation cancelled by user")]
    Cancelled,
}

impl SimError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn mismatch(what: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::DimensionMismatch {
            what: what.into(),
            expected,
            found,
        }
    }
}

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {e}"))
    }
}

impl From<std::io::Error> for SimError {
    fn from(e: std::io::Error) -> Self {
        Self::Config(format!("IO error: {e}"))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SimError>;
