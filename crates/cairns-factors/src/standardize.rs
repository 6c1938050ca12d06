//! Cross-sectional factor standardization.
//!
//! Per date and factor: clip outliers, then z-score over the clipped
//! cross-section. A date whose cross-section is too small or degenerate
//! produces no output for that factor rather than NaN or zeros.

use serde::{Deserialize, Serialize};

use cairns_data::ObservationPanel;

use crate::error::{FactorError, Result};

/// Outlier clipping method applied before z-scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ClipMethod {
    /// Clip to `[median - k*MAD, median + k*MAD]`.
    ///
    /// A zero MAD (more than half the section at the median) leaves the
    /// section unclipped so a non-constant cross-section still standardizes.
    MedianAbsDev {
        /// Number of MADs from the median at which values are clipped.
        k: f64,
    },
    /// Winsorize at the given lower/upper quantiles.
    Quantile {
        /// Lower quantile in `[0, 1)`.
        lower: f64,
        /// Upper quantile in `(lower, 1]`.
        upper: f64,
    },
}

impl Default for ClipMethod {
    fn default() -> Self {
        Self::MedianAbsDev { k: 3.0 }
    }
}

/// Configuration for the cross-sectional standardizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardizeConfig {
    /// Outlier clipping applied before z-scoring.
    pub clip: ClipMethod,
    /// Minimum available cross-section size; smaller dates are unavailable.
    pub min_cross_section: usize,
}

impl Default for StandardizeConfig {
    fn default() -> Self {
        Self {
            clip: ClipMethod::default(),
            min_cross_section: 5,
        }
    }
}

/// Cross-sectional standardizer. Pure function of one date's cross-section.
#[derive(Debug, Clone)]
pub struct Standardizer {
    config: StandardizeConfig,
}

impl Standardizer {
    /// Create a standardizer, validating the configuration.
    pub fn new(config: StandardizeConfig) -> Result<Self> {
        match config.clip {
            ClipMethod::MedianAbsDev { k } => {
                if !(k > 0.0) || !k.is_finite() {
                    return Err(FactorError::InvalidParameter(format!(
                        "MAD clip multiple must be positive and finite, got {k}"
                    )));
                }
            }
            ClipMethod::Quantile { lower, upper } => {
                if !(0.0..1.0).contains(&lower) || !(0.0..=1.0).contains(&upper) || lower >= upper {
                    return Err(FactorError::InvalidParameter(format!(
                        "quantile bounds must satisfy 0 <= lower < upper <= 1, got [{lower}, {upper}]"
                    )));
                }
            }
        }
        if config.min_cross_section < 2 {
            return Err(FactorError::InvalidParameter(format!(
                "minimum cross-section must be at least 2, got {}",
                config.min_cross_section
            )));
        }
        Ok(Self { config })
    }

    /// The active configuration.
    pub const fn config(&self) -> &StandardizeConfig {
        &self.config
    }

    /// Standardize one cross-section.
    ///
    /// Input and output are aligned: `values[i]` belongs to instrument `i`.
    /// Returns `None` when fewer than `min_cross_section` values are
    /// available or the clipped section has zero dispersion; otherwise
    /// missing inputs stay `None` in the output.
    pub fn standardize(&self, values: &[Option<f64>]) -> Option<Vec<Option<f64>>> {
        let available: Vec<(usize, f64)> = values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|x| (i, x)))
            .collect();
        if available.len() < self.config.min_cross_section {
            return None;
        }

        let raw: Vec<f64> = available.iter().map(|&(_, v)| v).collect();
        let clipped: Vec<f64> = match self.config.clip {
            ClipMethod::MedianAbsDev { k } => {
                let med = median(&raw);
                let deviations: Vec<f64> = raw.iter().map(|v| (v - med).abs()).collect();
                let mad = median(&deviations);
                if mad > 0.0 {
                    let lo = med - k * mad;
                    let hi = med + k * mad;
                    raw.iter().map(|v| v.clamp(lo, hi)).collect()
                } else {
                    raw
                }
            }
            ClipMethod::Quantile { lower, upper } => {
                let lo = quantile(&raw, lower);
                let hi = quantile(&raw, upper);
                raw.iter().map(|v| v.clamp(lo, hi)).collect()
            }
        };

        let n = clipped.len() as f64;
        let mean = clipped.iter().sum::<f64>() / n;
        let var = clipped.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let std = var.sqrt();
        if std <= f64::EPSILON {
            return None;
        }

        let mut out = vec![None; values.len()];
        for (&(idx, _), &v) in available.iter().zip(&clipped) {
            out[idx] = Some((v - mean) / std);
        }
        Some(out)
    }

    /// Standardize every (factor, date) cross-section of a panel.
    pub fn standardize_panel(&self, panel: &ObservationPanel) -> StandardizedPanel {
        let values = (0..panel.n_factors())
            .map(|f| {
                (0..panel.n_dates())
                    .map(|d| self.standardize(&panel.factor_cross_section(d, f)))
                    .collect()
            })
            .collect();
        StandardizedPanel { values }
    }
}

/// Standardized factor values, factor-major then date-major.
///
/// `None` at the date level means the whole cross-section was unavailable
/// (too small or degenerate); `None` inside a cross-section means that one
/// instrument had no value.
#[derive(Debug, Clone)]
pub struct StandardizedPanel {
    values: Vec<Vec<Option<Vec<Option<f64>>>>>,
}

impl StandardizedPanel {
    /// Standardized value for (factor, date, instrument).
    pub fn value(&self, factor_idx: usize, date_idx: usize, inst_idx: usize) -> Option<f64> {
        self.values[factor_idx][date_idx]
            .as_ref()
            .and_then(|xs| xs[inst_idx])
    }

    /// One factor's standardized cross-section on a date, if available.
    pub fn cross_section(&self, factor_idx: usize, date_idx: usize) -> Option<&[Option<f64>]> {
        self.values[factor_idx][date_idx].as_deref()
    }

    /// Number of factors.
    pub fn n_factors(&self) -> usize {
        self.values.len()
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn standardizer(min: usize) -> Standardizer {
        Standardizer::new(StandardizeConfig {
            clip: ClipMethod::default(),
            min_cross_section: min,
        })
        .unwrap()
    }

    fn mean_std(values: &[Option<f64>]) -> (f64, f64) {
        let xs: Vec<f64> = values.iter().filter_map(|v| *v).collect();
        let n = xs.len() as f64;
        let mean = xs.iter().sum::<f64>() / n;
        let var = xs.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        (mean, var.sqrt())
    }

    #[rstest]
    #[case(vec![1.0, 2.0, 3.0, 4.0, 5.0])]
    #[case(vec![-3.0, 0.5, 2.0, 2.0, 7.5, 11.0])]
    #[case(vec![0.001, 0.002, 0.004, 0.008, 0.016, 0.032, 0.064])]
    fn standardized_section_has_zero_mean_unit_std(#[case] raw: Vec<f64>) {
        let input: Vec<Option<f64>> = raw.into_iter().map(Some).collect();
        let out = standardizer(2).standardize(&input).unwrap();
        let (mean, std) = mean_std(&out);
        assert_relative_eq!(mean, 0.0, epsilon = 1e-10);
        assert_relative_eq!(std, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn outliers_are_clipped_to_mad_bounds() {
        // median 3, MAD 1, k=3 -> bounds [0, 6]; the 100 is pulled to 6
        let input: Vec<Option<f64>> = vec![1.0, 2.0, 3.0, 4.0, 100.0]
            .into_iter()
            .map(Some)
            .collect();
        let out = standardizer(2).standardize(&input).unwrap();
        // Same result as standardizing [1, 2, 3, 4, 6] directly
        let reference: Vec<Option<f64>> =
            vec![1.0, 2.0, 3.0, 4.0, 6.0].into_iter().map(Some).collect();
        let expected = standardizer(2).standardize(&reference).unwrap();
        for (a, b) in out.iter().zip(&expected) {
            assert_relative_eq!(a.unwrap(), b.unwrap(), epsilon = 1e-12);
        }
        // Bounded: no standardized value is an extreme z
        assert!(out.iter().flatten().all(|z| z.abs() < 3.0));
    }

    #[test]
    fn quantile_clip_winsorizes_tails() {
        let input: Vec<Option<f64>> = (1..=10).map(|v| Some(v as f64)).collect();
        let s = Standardizer::new(StandardizeConfig {
            clip: ClipMethod::Quantile {
                lower: 0.2,
                upper: 0.8,
            },
            min_cross_section: 2,
        })
        .unwrap();
        let out = s.standardize(&input).unwrap();
        let (mean, std) = mean_std(&out);
        assert_relative_eq!(mean, 0.0, epsilon = 1e-10);
        assert_relative_eq!(std, 1.0, epsilon = 1e-10);
        // the 20th percentile (2.8) swallows both 1 and 2, so the low
        // tail ties; same at the top
        assert_relative_eq!(out[0].unwrap(), out[1].unwrap(), epsilon = 1e-12);
        assert_relative_eq!(out[9].unwrap(), out[8].unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn small_cross_section_is_unavailable() {
        let input = vec![Some(1.0), Some(2.0), None, None, None];
        assert!(standardizer(3).standardize(&input).is_none());
    }

    #[test]
    fn constant_cross_section_is_unavailable() {
        let input = vec![Some(4.0); 6];
        assert!(standardizer(2).standardize(&input).is_none());
    }

    #[test]
    fn zero_mad_still_standardizes_nonconstant_section() {
        // More than half the values at the median: MAD is 0, but the
        // section is not constant, so it standardizes unclipped.
        let input: Vec<Option<f64>> = vec![5.0, 5.0, 5.0, 5.0, 9.0].into_iter().map(Some).collect();
        let out = standardizer(2).standardize(&input).unwrap();
        let (mean, std) = mean_std(&out);
        assert_relative_eq!(mean, 0.0, epsilon = 1e-10);
        assert_relative_eq!(std, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn missing_inputs_stay_missing() {
        let input = vec![Some(1.0), None, Some(2.0), Some(3.0), Some(4.0)];
        let out = standardizer(2).standardize(&input).unwrap();
        assert!(out[1].is_none());
        assert_eq!(out.iter().flatten().count(), 4);
    }

    #[rstest]
    #[case(ClipMethod::MedianAbsDev { k: 0.0 })]
    #[case(ClipMethod::MedianAbsDev { k: -1.0 })]
    #[case(ClipMethod::Quantile { lower: 0.5, upper: 0.5 })]
    #[case(ClipMethod::Quantile { lower: -0.1, upper: 0.9 })]
    fn invalid_clip_config_fails_fast(#[case] clip: ClipMethod) {
        let err = Standardizer::new(StandardizeConfig {
            clip,
            min_cross_section: 5,
        })
        .unwrap_err();
        assert!(matches!(err, FactorError::InvalidParameter(_)));
    }

    #[test]
    fn median_of_even_length_interpolates() {
        assert_relative_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_relative_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
    }
}
