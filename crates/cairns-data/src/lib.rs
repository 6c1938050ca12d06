#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/cairns/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod frame;
pub mod panel;

pub use error::{DataError, Result};
pub use frame::{panel_from_csv, panel_from_dataframe};
pub use panel::{Bar, ObservationPanel, PanelBuilder};
