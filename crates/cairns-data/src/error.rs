//! Error types for panel construction and data ingestion.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while building or ingesting an observation panel.
#[derive(Debug, Error)]
pub enum DataError {
    /// A required column is missing from the input frame.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// Polars error while reading or converting a frame.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// A row value was null or could not be parsed.
    #[error("data parsing error: {0}")]
    Parse(String),

    /// A date value could not be parsed.
    #[error("unparseable date: {0}")]
    DateParse(String),

    /// Rows arrived out of date order.
    ///
    /// The input contract requires non-decreasing dates; a violation here
    /// usually means the upstream loader shuffled or reversed its output.
    #[error("rows must arrive in non-decreasing date order: {symbol} on {date} after {latest}")]
    UnsortedDates {
        /// Instrument of the offending row.
        symbol: String,
        /// Date of the offending row.
        date: NaiveDate,
        /// Latest date seen before the offending row.
        latest: NaiveDate,
    },

    /// The same (instrument, date) pair was supplied twice.
    #[error("duplicate observation for {symbol} on {date}")]
    DuplicateObservation {
        /// Instrument of the duplicated row.
        symbol: String,
        /// Date of the duplicated row.
        date: NaiveDate,
    },

    /// A row supplied the wrong number of factor values.
    #[error("expected {expected} factor values, got {actual}")]
    FactorArity {
        /// Number of factor columns declared on the builder.
        expected: usize,
        /// Number of values supplied with the row.
        actual: usize,
    },

    /// The panel contains no observations.
    #[error("empty panel: no observations were supplied")]
    EmptyPanel,
}
