//! Error types for the backtest engine.

use thiserror::Error;

/// Result type for backtest operations.
pub type Result<T> = std::result::Result<T, BacktestError>;

/// Errors that can occur while configuring or running a simulation.
///
/// A rebalance date with no eligible instruments is not an error — the
/// portfolio moves to cash for that period.
#[derive(Debug, Error)]
pub enum BacktestError {
    /// Invalid configuration parameter, caught before the run starts.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Score series and panel dimensions disagree.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },
}
