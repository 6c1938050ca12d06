//! Instrument selection and target weight construction.
//!
//! Rebalance targets are built from the composite score cross-section:
//! rank eligible instruments, take the top K long (and optionally the
//! bottom K short), weight them equally or by score, then cap each name.
//! Unscored instruments are never selected.

use serde::{Deserialize, Serialize};

/// How weights are apportioned among selected instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeightingScheme {
    /// Each selected name gets an equal share.
    #[default]
    EqualWeight,
    /// Shares proportional to the score's distance from the worst
    /// selected score; falls back to equal weight when the selected
    /// scores are indistinguishable.
    ScoreWeighted,
}

/// Build uncapped target weights from one date's scores.
///
/// `eligible[i]` gates instrument `i` (liquidity filters and the like).
/// Longs sum to +1 and shorts, when `bottom_k` is set, to −1; the caller
/// applies de-risk scaling and position caps afterwards. An empty result
/// means the portfolio should sit in cash.
pub fn select_targets(
    scores: &[Option<f64>],
    eligible: &[bool],
    top_k: usize,
    bottom_k: Option<usize>,
    weighting: WeightingScheme,
) -> Vec<(usize, f64)> {
    debug_assert_eq!(scores.len(), eligible.len());
    let mut ranked: Vec<(usize, f64)> = scores
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.filter(|v| v.is_finite() && eligible[i]).map(|v| (i, v)))
        .collect();
    if ranked.is_empty() {
        return Vec::new();
    }
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let n_long = top_k.min(ranked.len());
    let n_short = bottom_k
        .map(|k| k.min(ranked.len().saturating_sub(n_long)))
        .unwrap_or(0);

    let mut targets = Vec::with_capacity(n_long + n_short);
    targets.extend(apportion(&ranked[..n_long], weighting, 1.0));
    if n_short > 0 {
        let shorts = &ranked[ranked.len() - n_short..];
        targets.extend(apportion(shorts, weighting, -1.0));
    }
    targets
}

/// Cap each target at the maximum absolute position weight. Excess
/// exposure stays in cash; it is not redistributed to other names.
pub fn cap_weights(targets: &mut [(usize, f64)], max_weight: f64) {
    for (_, w) in targets.iter_mut() {
        *w = w.signum() * w.abs().min(max_weight);
    }
}

fn apportion(selected: &[(usize, f64)], weighting: WeightingScheme, sign: f64) -> Vec<(usize, f64)> {
    let n = selected.len();
    if n == 0 {
        return Vec::new();
    }
    match weighting {
        WeightingScheme::EqualWeight => selected
            .iter()
            .map(|&(i, _)| (i, sign / n as f64))
            .collect(),
        WeightingScheme::ScoreWeighted => {
            // distance from the worst selected score; for shorts the
            // "worst" is the highest, so weight grows toward the extreme
            let (best, worst) = if sign > 0.0 {
                (selected[0].1, selected[n - 1].1)
            } else {
                (selected[n - 1].1, selected[0].1)
            };
            let spread = (best - worst).abs();
            if spread < 1e-12 {
                return selected
                    .iter()
                    .map(|&(i, _)| (i, sign / n as f64))
                    .collect();
            }
            let raw: Vec<f64> = selected
                .iter()
                .map(|&(_, s)| (s - worst).abs() + spread / n as f64)
                .collect();
            let total: f64 = raw.iter().sum();
            selected
                .iter()
                .zip(&raw)
                .map(|(&(i, _), &r)| (i, sign * r / total))
                .collect()
        }
    }
}
