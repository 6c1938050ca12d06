//! Drawdown-based de-risking.
//!
//! When the equity path falls more than a configured fraction from its
//! running peak, the next rebalance scales every target weight toward cash
//! by the de-risk factor. Scaling happens before position caps are applied.

use serde::{Deserialize, Serialize};

use crate::error::{BacktestError, Result};

/// Configuration for drawdown-triggered de-risking.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DrawdownControl {
    /// Trailing drawdown beyond which de-risking engages, in (0, 1).
    pub threshold: f64,
    /// Multiplier applied to target weights while engaged, in [0, 1].
    pub derisk_factor: f64,
}

impl DrawdownControl {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(BacktestError::InvalidParameter(format!(
                "drawdown threshold must be in (0, 1), got {}",
                self.threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.derisk_factor) {
            return Err(BacktestError::InvalidParameter(format!(
                "de-risk factor must be in [0, 1], got {}",
                self.derisk_factor
            )));
        }
        Ok(())
    }
}

/// Tracks the running equity peak to measure trailing drawdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrawdownTracker {
    peak: f64,
}

impl DrawdownTracker {
    /// A tracker with no history.
    pub const fn new() -> Self {
        Self { peak: 0.0 }
    }

    /// Record the equity at the end of a period.
    pub fn observe(&mut self, equity: f64) {
        if equity > self.peak {
            self.peak = equity;
        }
    }

    /// Trailing drawdown of `equity` from the running peak, in [0, 1).
    pub fn drawdown(&self, equity: f64) -> f64 {
        if self.peak <= 0.0 {
            return 0.0;
        }
        (1.0 - equity / self.peak).max(0.0)
    }
}
