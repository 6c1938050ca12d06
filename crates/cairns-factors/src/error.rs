//! Error types for the factor scoring engine.

use thiserror::Error;

/// Result type for factor operations.
pub type Result<T> = std::result::Result<T, FactorError>;

/// Errors that can occur during standardization, IC estimation, weighting
/// or scoring.
///
/// Insufficient cross-sections are not fatal at the pipeline level — the
/// affected (date, factor) output is simply unavailable; the typed variant
/// is returned by the low-level kernels when called directly. Look-ahead
/// and parameter errors always halt the run.
#[derive(Debug, Error)]
pub enum FactorError {
    /// Cross-section below the minimum size for the operation.
    #[error("insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations.
        required: usize,
        /// Actual number of observations.
        actual: usize,
    },

    /// Invalid configuration parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A factor name is not present in the panel.
    #[error("unknown factor: {0}")]
    UnknownFactor(String),

    /// Observations were fed to a rolling state machine out of date order.
    ///
    /// Indicates a caller bug: information dated at or before an already
    /// observed date was supplied again, or future data was supplied early.
    #[error("look-ahead violation: observation for index {date_index} after index {last}")]
    LookAhead {
        /// Calendar index of the offending observation.
        date_index: usize,
        /// Latest calendar index already observed.
        last: usize,
    },

    /// Two aligned series had different lengths.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },
}
