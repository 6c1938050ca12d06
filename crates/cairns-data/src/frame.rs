//! Ingestion of long-format polars frames into an [`ObservationPanel`].
//!
//! The input contract: one row per (instrument, date) with columns
//! `symbol`, `date`, `open`, `close`, `volume` plus one column per raw
//! factor, rows in non-decreasing date order. Extra columns are ignored.

use std::path::Path;

use chrono::NaiveDate;
use polars::prelude::*;

use crate::error::{DataError, Result};
use crate::panel::{Bar, ObservationPanel};

/// Convert a long-format `DataFrame` into an observation panel.
///
/// `factor_columns` names the raw factor columns to carry, in the order the
/// scoring engine should see them. The `date` column may be a polars `Date`
/// or a `%Y-%m-%d` string; numeric columns are cast to `f64`.
pub fn panel_from_dataframe(
    df: &DataFrame,
    factor_columns: &[String],
) -> Result<ObservationPanel> {
    let symbols = required(df, "symbol")?.str()?;
    let dates = required(df, "date")?.cast(&DataType::String)?;
    let dates = dates.str()?;
    let opens = required(df, "open")?.cast(&DataType::Float64)?;
    let opens = opens.f64()?;
    let closes = required(df, "close")?.cast(&DataType::Float64)?;
    let closes = closes.f64()?;
    let volumes = required(df, "volume")?.cast(&DataType::Float64)?;
    let volumes = volumes.f64()?;

    let factor_cast: Vec<Column> = factor_columns
        .iter()
        .map(|name| Ok(required(df, name)?.cast(&DataType::Float64)?))
        .collect::<Result<_>>()?;
    let factor_arrays: Vec<&Float64Chunked> = factor_cast
        .iter()
        .map(|c| c.f64())
        .collect::<PolarsResult<_>>()?;

    let mut builder = ObservationPanel::builder(factor_columns.to_vec());
    let mut factor_row = vec![None; factor_columns.len()];

    for i in 0..df.height() {
        let symbol = symbols
            .get(i)
            .ok_or_else(|| DataError::Parse(format!("missing symbol in row {i}")))?;
        let date_str = dates
            .get(i)
            .ok_or_else(|| DataError::Parse(format!("missing date in row {i}")))?;
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|_| DataError::DateParse(date_str.to_string()))?;

        let bar = Bar {
            open: opens.get(i),
            close: closes.get(i),
            volume: volumes.get(i),
        };
        for (slot, arr) in factor_row.iter_mut().zip(&factor_arrays) {
            *slot = arr.get(i);
        }
        builder.push(symbol, date, bar, &factor_row)?;
    }

    builder.finish()
}

/// Read a CSV file from disk and convert it into an observation panel.
///
/// Expects a header row matching the [`panel_from_dataframe`] contract.
pub fn panel_from_csv(path: &Path, factor_columns: &[String]) -> Result<ObservationPanel> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    panel_from_dataframe(&df, factor_columns)
}

fn required<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| DataError::MissingColumn(name.to_string()))
}
