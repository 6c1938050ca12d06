//! Information coefficient estimation.
//!
//! The IC for a (factor, date) pair is the cross-sectional correlation
//! between standardized factor values and forward returns over the
//! instruments where both are available. Dates with too few pairs emit no
//! coefficient at all — an insufficient sample is never reported as zero.

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{FactorError, Result};

/// Correlation method used for the IC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IcMethod {
    /// Pearson product-moment correlation on the raw pairs.
    Pearson,
    /// Spearman rank correlation (average ranks for ties).
    Spearman,
}

impl Default for IcMethod {
    fn default() -> Self {
        Self::Spearman
    }
}

/// Configuration for the IC estimator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IcConfig {
    /// Correlation method.
    pub method: IcMethod,
    /// Minimum number of (factor, forward-return) pairs per date.
    pub min_observations: usize,
}

impl Default for IcConfig {
    fn default() -> Self {
        Self {
            method: IcMethod::default(),
            min_observations: 20,
        }
    }
}

/// Per-date cross-sectional IC estimator.
#[derive(Debug, Clone)]
pub struct IcEstimator {
    config: IcConfig,
}

impl IcEstimator {
    /// Create an estimator, validating the configuration.
    pub fn new(config: IcConfig) -> Result<Self> {
        if config.min_observations < 3 {
            return Err(FactorError::InvalidParameter(format!(
                "IC minimum observations must be at least 3, got {}",
                config.min_observations
            )));
        }
        Ok(Self { config })
    }

    /// The active configuration.
    pub const fn config(&self) -> &IcConfig {
        &self.config
    }

    /// Estimate the IC for one date.
    ///
    /// `factor_values` and `forward_returns` are instrument-aligned; only
    /// pairs where both sides are available enter the correlation. Returns
    /// `None` below the minimum pair count or when either side is constant.
    pub fn estimate(
        &self,
        factor_values: &[Option<f64>],
        forward_returns: &[Option<f64>],
    ) -> Option<f64> {
        debug_assert_eq!(factor_values.len(), forward_returns.len());
        let (xs, ys): (Vec<f64>, Vec<f64>) = factor_values
            .iter()
            .zip(forward_returns)
            .filter_map(|(x, y)| Some((((*x)?), ((*y)?))))
            .unzip();
        if xs.len() < self.config.min_observations {
            return None;
        }
        let coefficient = match self.config.method {
            IcMethod::Pearson => {
                pearson_correlation(Array1::from_vec(xs).view(), Array1::from_vec(ys).view())
            }
            IcMethod::Spearman => {
                let rx = Array1::from_vec(average_ranks(&xs));
                let ry = Array1::from_vec(average_ranks(&ys));
                pearson_correlation(rx.view(), ry.view())
            }
        };
        if coefficient.is_finite() {
            Some(coefficient.clamp(-1.0, 1.0))
        } else {
            None
        }
    }
}

/// Pearson correlation between two equal-length vectors.
///
/// Returns NaN for constant inputs or fewer than two observations.
pub fn pearson_correlation(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> f64 {
    let n = x.len();
    if n < 2 || n != y.len() {
        return f64::NAN;
    }
    let mean_x = x.mean().unwrap_or(f64::NAN);
    let mean_y = y.mean().unwrap_or(f64::NAN);
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x <= 0.0 || var_y <= 0.0 {
        return f64::NAN;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}

/// Average ranks (1-based) with ties sharing the mean of their positions.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // positions i..=j (0-based) share the average of ranks i+1..=j+1
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg;
        }
        i = j + 1;
    }
    ranks
}
