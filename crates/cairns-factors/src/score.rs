//! Composite score construction.
//!
//! A composite score for (instrument, date) is the weighted sum of the
//! standardized factor values available for that instrument that date,
//! with weights renormalized so their absolute values sum to one over the
//! available subset. Factor availability varies with warm-up state and
//! data gaps, so the renormalization set is decided per instrument.

/// Combine one date's standardized cross-sections into composite scores.
///
/// `sections[f]` is factor `f`'s standardized cross-section for the date
/// (`None` when the whole section was unavailable), `weights[f]` the
/// factor's rolling weight (`None` while warming). Output is aligned with
/// instruments; an instrument with no available (weight, value) pair gets
/// `None`, not zero.
pub fn composite_scores(
    sections: &[Option<&[Option<f64>]>],
    weights: &[Option<f64>],
    n_instruments: usize,
) -> Vec<Option<f64>> {
    debug_assert_eq!(sections.len(), weights.len());
    (0..n_instruments)
        .map(|inst| {
            let mut norm = 0.0;
            let mut sum = 0.0;
            let mut any = false;
            for (section, weight) in sections.iter().zip(weights) {
                let (Some(section), Some(w)) = (section, weight) else {
                    continue;
                };
                let Some(z) = section[inst] else {
                    continue;
                };
                norm += w.abs();
                sum += w * z;
                any = true;
            }
            if !any || norm <= 0.0 {
                return None;
            }
            Some(sum / norm)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn weighted_sum_renormalizes_over_available_subset() {
        let a = [Some(1.0), Some(-1.0), Some(0.5)];
        let b = [Some(2.0), None, Some(-0.5)];
        let sections: Vec<Option<&[Option<f64>]>> = vec![Some(&a), Some(&b)];
        let weights = vec![Some(3.0), Some(1.0)];

        let scores = composite_scores(&sections, &weights, 3);
        // both factors: (3*z_a + 1*z_b) / 4
        assert_relative_eq!(scores[0].unwrap(), (3.0 * 1.0 + 2.0) / 4.0, epsilon = 1e-12);
        // factor b missing for the middle instrument: weight renormalizes to a alone
        assert_relative_eq!(scores[1].unwrap(), -1.0, epsilon = 1e-12);
        assert_relative_eq!(scores[2].unwrap(), (3.0 * 0.5 - 0.5) / 4.0, epsilon = 1e-12);
    }

    #[test]
    fn single_available_factor_passes_through() {
        let a = [Some(0.7), Some(-0.2)];
        let sections: Vec<Option<&[Option<f64>]>> = vec![Some(&a), None];
        let weights = vec![Some(2.5), None];
        let scores = composite_scores(&sections, &weights, 2);
        assert_relative_eq!(scores[0].unwrap(), 0.7, epsilon = 1e-12);
        assert_relative_eq!(scores[1].unwrap(), -0.2, epsilon = 1e-12);
    }

    #[test]
    fn negative_weight_flips_the_sign() {
        let a = [Some(0.7)];
        let sections: Vec<Option<&[Option<f64>]>> = vec![Some(&a)];
        let weights = vec![Some(-2.0)];
        let scores = composite_scores(&sections, &weights, 1);
        assert_relative_eq!(scores[0].unwrap(), -0.7, epsilon = 1e-12);
    }

    #[test]
    fn no_available_factor_yields_no_score() {
        let a = [None, Some(0.5)];
        let sections: Vec<Option<&[Option<f64>]>> = vec![Some(&a), None];
        // first factor warming for weights, second unavailable entirely
        let weights = vec![None, Some(1.0)];
        let scores = composite_scores(&sections, &weights, 2);
        assert_eq!(scores, vec![None, None]);
    }

    #[test]
    fn zero_total_weight_yields_no_score() {
        let a = [Some(1.0)];
        let sections: Vec<Option<&[Option<f64>]>> = vec![Some(&a)];
        let weights = vec![Some(0.0)];
        assert_eq!(composite_scores(&sections, &weights, 1), vec![None]);
    }
}
