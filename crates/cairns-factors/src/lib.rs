#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/cairns/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod forward;
pub mod ic;
pub mod model;
pub mod score;
pub mod standardize;
pub mod weights;

pub use error::{FactorError, Result};
pub use forward::ForwardReturns;
pub use ic::{IcConfig, IcEstimator, IcMethod, average_ranks, pearson_correlation};
pub use model::{IcSeries, ScoreOutput, ScoringConfig, ScoringModel};
pub use score::composite_scores;
pub use standardize::{ClipMethod, StandardizeConfig, StandardizedPanel, Standardizer};
pub use weights::{RollingWeightEngine, WeightConfig, WeightState};
