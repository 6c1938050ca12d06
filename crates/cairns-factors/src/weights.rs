//! Rolling IC-based factor weighting.
//!
//! One state machine per factor, advanced one date at a time. The machine
//! keeps a fixed-capacity ring of the most recent available ICs; it warms
//! up until the ring is full, then emits `mean / (std + ε)` clipped to a
//! configurable bound. Unavailable ICs are skipped, never zero-filled.
//!
//! Causality: callers read [`RollingWeightEngine::weight`] for a date
//! *before* observing that date's IC. [`observe`](RollingWeightEngine::observe)
//! rejects out-of-order feeds so that a violation surfaces as an error
//! instead of silently contaminating the window.

use serde::{Deserialize, Serialize};

use crate::error::{FactorError, Result};

/// Stabilizer added to the IC standard deviation in the weight ratio.
const EPSILON: f64 = 1e-8;

/// Configuration for the rolling weight engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightConfig {
    /// Number of IC observations in the trailing window.
    pub window: usize,
    /// Maximum absolute weight a single factor may receive.
    pub max_abs_weight: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            window: 60,
            max_abs_weight: 3.0,
        }
    }
}

/// Warm-up state of a weight engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightState {
    /// Fewer than `window` ICs observed; no weight is emitted.
    Warming,
    /// Full window available; weights are emitted.
    Active,
}

/// Per-factor rolling weight state machine.
#[derive(Debug, Clone)]
pub struct RollingWeightEngine {
    config: WeightConfig,
    ring: Vec<f64>,
    head: usize,
    last_observed: Option<usize>,
}

impl RollingWeightEngine {
    /// Create an engine, validating the configuration.
    pub fn new(config: WeightConfig) -> Result<Self> {
        if config.window < 2 {
            return Err(FactorError::InvalidParameter(format!(
                "IC window must be at least 2, got {}",
                config.window
            )));
        }
        if !(config.max_abs_weight > 0.0) || !config.max_abs_weight.is_finite() {
            return Err(FactorError::InvalidParameter(format!(
                "maximum absolute weight must be positive and finite, got {}",
                config.max_abs_weight
            )));
        }
        let ring = Vec::with_capacity(config.window);
        Ok(Self {
            config,
            ring,
            head: 0,
            last_observed: None,
        })
    }

    /// The active configuration.
    pub const fn config(&self) -> &WeightConfig {
        &self.config
    }

    /// Current warm-up state.
    pub fn state(&self) -> WeightState {
        if self.ring.len() < self.config.window {
            WeightState::Warming
        } else {
            WeightState::Active
        }
    }

    /// Number of ICs currently in the window.
    pub fn observations(&self) -> usize {
        self.ring.len()
    }

    /// Record one realized IC, keyed by its calendar index.
    ///
    /// Indices must be strictly increasing across calls; a repeat or
    /// regression is a look-ahead violation. Skipped indices are fine —
    /// they are dates whose IC was unavailable.
    pub fn observe(&mut self, date_index: usize, ic: f64) -> Result<()> {
        if let Some(last) = self.last_observed {
            if date_index <= last {
                return Err(FactorError::LookAhead { date_index, last });
            }
        }
        if !ic.is_finite() {
            return Err(FactorError::InvalidParameter(format!(
                "IC observation must be finite, got {ic}"
            )));
        }
        self.last_observed = Some(date_index);
        if self.ring.len() < self.config.window {
            self.ring.push(ic);
        } else {
            self.ring[self.head] = ic;
            self.head = (self.head + 1) % self.config.window;
        }
        Ok(())
    }

    /// The weight derived from the ICs observed so far.
    ///
    /// `None` while warming. In the active state the weight is
    /// `mean / (std + ε)` over the window, clipped to `±max_abs_weight`;
    /// a near-constant window saturates at the clip rather than blowing up.
    pub fn weight(&self) -> Option<f64> {
        if self.state() == WeightState::Warming {
            return None;
        }
        let n = self.ring.len() as f64;
        let mean = self.ring.iter().sum::<f64>() / n;
        let var = self.ring.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let raw = mean / (var.sqrt() + EPSILON);
        Some(raw.clamp(-self.config.max_abs_weight, self.config.max_abs_weight))
    }
}
