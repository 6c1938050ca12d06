//! Export of backtest artifacts to CSV and JSON.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::equity::EquityCurve;
use crate::summary::PerformanceSummary;
use crate::trades::TradeLog;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write the equity curve as CSV with a `date,equity,period_return` header.
pub fn write_equity_csv(curve: &EquityCurve, path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for point in curve.points() {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the trade log as CSV with a `date,symbol,delta_weight,cost` header.
pub fn write_trades_csv(trades: &TradeLog, path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in trades.records() {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Serialize the summary as pretty-printed JSON.
pub fn summary_to_json(summary: &PerformanceSummary) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(summary)?)
}

/// Write the summary as a JSON file.
pub fn write_summary_json(summary: &PerformanceSummary, path: &Path) -> Result<(), ExportError> {
    let mut file = File::create(path)?;
    file.write_all(summary_to_json(summary)?.as_bytes())?;
    Ok(())
}
