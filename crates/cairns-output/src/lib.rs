#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/cairns/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod equity;
pub mod export;
pub mod summary;
pub mod trades;

pub use equity::{EquityCurve, EquityPoint};
pub use export::{
    ExportError, summary_to_json, write_equity_csv, write_summary_json, write_trades_csv,
};
pub use summary::{PerformanceSummary, sharpe};
pub use trades::{TradeLog, TradeRecord};
