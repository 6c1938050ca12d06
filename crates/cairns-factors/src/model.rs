//! The scoring model: one date-ordered pass from raw panel to composite
//! scores.
//!
//! For each date D the model standardizes the cross-sections, reads the
//! rolling weights, and emits composite scores. The weight engines only
//! ever see ICs whose forward window has fully closed (`t + H <= D`), so a
//! weight for D depends on dates strictly before D and on no price dated
//! after D.

use serde::{Deserialize, Serialize};

use cairns_data::ObservationPanel;

use crate::error::{FactorError, Result};
use crate::forward::ForwardReturns;
use crate::ic::{IcConfig, IcEstimator};
use crate::score::composite_scores;
use crate::standardize::{StandardizeConfig, Standardizer};
use crate::weights::{RollingWeightEngine, WeightConfig};

/// Configuration for the full scoring model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Cross-sectional standardization.
    pub standardize: StandardizeConfig,
    /// IC estimation.
    pub ic: IcConfig,
    /// Rolling weight derivation.
    pub weight: WeightConfig,
    /// Forward-return horizon in periods.
    pub horizon: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            standardize: StandardizeConfig::default(),
            ic: IcConfig::default(),
            weight: WeightConfig::default(),
            horizon: 1,
        }
    }
}

impl ScoringConfig {
    /// A default configuration with the given horizon.
    pub fn with_horizon(horizon: usize) -> Self {
        Self {
            horizon,
            ..Self::default()
        }
    }
}

/// Per-factor IC history aligned with the panel calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IcSeries {
    /// Factor name.
    pub factor: String,
    /// IC per calendar date; `None` where the cross-section was too small.
    pub values: Vec<Option<f64>>,
}

impl IcSeries {
    /// Mean of the available ICs, if any.
    pub fn mean(&self) -> Option<f64> {
        let available: Vec<f64> = self.values.iter().flatten().copied().collect();
        if available.is_empty() {
            return None;
        }
        Some(available.iter().sum::<f64>() / available.len() as f64)
    }

    /// Number of available ICs.
    pub fn coverage(&self) -> usize {
        self.values.iter().flatten().count()
    }
}

/// Output of one scoring run.
#[derive(Debug, Clone)]
pub struct ScoreOutput {
    /// Composite score per (date, instrument); `None` where unavailable.
    pub scores: Vec<Vec<Option<f64>>>,
    /// IC history per factor, in panel factor order.
    pub ic: Vec<IcSeries>,
    /// Rolling weight per (date, factor) as read at that date, before
    /// per-instrument renormalization. `None` while the factor warms up.
    pub weights: Vec<Vec<Option<f64>>>,
}

impl ScoreOutput {
    /// Composite score for (date, instrument).
    pub fn score(&self, date_idx: usize, inst_idx: usize) -> Option<f64> {
        self.scores[date_idx][inst_idx]
    }
}

/// Composes the standardizer, IC estimator and weight engines into a
/// single date-by-date driver.
#[derive(Debug, Clone)]
pub struct ScoringModel {
    standardizer: Standardizer,
    ic_estimator: IcEstimator,
    weight_config: WeightConfig,
    horizon: usize,
}

impl ScoringModel {
    /// Create a model, validating all component configurations up front.
    pub fn new(config: ScoringConfig) -> Result<Self> {
        if config.horizon == 0 {
            return Err(FactorError::InvalidParameter(
                "forward-return horizon must be at least 1".to_string(),
            ));
        }
        let standardizer = Standardizer::new(config.standardize)?;
        let ic_estimator = IcEstimator::new(config.ic)?;
        // validate the weight config eagerly; engines are rebuilt per run
        RollingWeightEngine::new(config.weight.clone())?;
        Ok(Self {
            standardizer,
            ic_estimator,
            weight_config: config.weight,
            horizon: config.horizon,
        })
    }

    /// Run the model over a panel.
    pub fn run(&self, panel: &ObservationPanel) -> Result<ScoreOutput> {
        let n_dates = panel.n_dates();
        let n_factors = panel.n_factors();

        let standardized = self.standardizer.standardize_panel(panel);
        let forward = ForwardReturns::from_panel(panel, self.horizon)?;

        // Full IC history per factor. Each entry only depends on its own
        // date's cross-section and the forward window after it; when it is
        // consumed below is what keeps the pipeline causal.
        let ic: Vec<IcSeries> = (0..n_factors)
            .map(|f| IcSeries {
                factor: panel.factor_names()[f].clone(),
                values: (0..n_dates)
                    .map(|d| {
                        standardized
                            .cross_section(f, d)
                            .and_then(|xs| self.ic_estimator.estimate(xs, forward.cross_section(d)))
                    })
                    .collect(),
            })
            .collect();

        let mut engines: Vec<RollingWeightEngine> = (0..n_factors)
            .map(|_| RollingWeightEngine::new(self.weight_config.clone()))
            .collect::<Result<_>>()?;

        let mut scores = Vec::with_capacity(n_dates);
        let mut weights = Vec::with_capacity(n_dates);
        for d in 0..n_dates {
            // The IC for date t is realized once its forward window closes
            // at t + H; feed it the first date that happens.
            if let Some(t) = d.checked_sub(self.horizon) {
                for (f, engine) in engines.iter_mut().enumerate() {
                    if let Some(value) = ic[f].values[t] {
                        engine.observe(t, value)?;
                    }
                }
            }

            let date_weights: Vec<Option<f64>> = engines.iter().map(|e| e.weight()).collect();
            let sections: Vec<Option<&[Option<f64>]>> = (0..n_factors)
                .map(|f| standardized.cross_section(f, d))
                .collect();
            scores.push(composite_scores(
                &sections,
                &date_weights,
                panel.n_instruments(),
            ));
            weights.push(date_weights);
        }

        Ok(ScoreOutput { scores, ic, weights })
    }
}
