#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/cairns/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cost;
pub mod engine;
pub mod error;
pub mod portfolio;
pub mod risk;
pub mod selection;

pub use cost::CostModel;
pub use engine::{BacktestConfig, BacktestEngine, BacktestOutput};
pub use error::{BacktestError, Result};
pub use portfolio::Portfolio;
pub use risk::{DrawdownControl, DrawdownTracker};
pub use selection::{WeightingScheme, cap_weights, select_targets};
