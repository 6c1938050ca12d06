//! Equity curve: the canonical artifact of a backtest run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One dated point on the equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    /// Calendar date of the observation.
    pub date: NaiveDate,
    /// Portfolio equity at the end of the period, costs deducted.
    pub equity: f64,
    /// Return over the period ending at `date`, net of costs.
    pub period_return: f64,
}

/// Ordered sequence of equity points, one per simulated date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquityCurve {
    points: Vec<EquityPoint>,
}

impl EquityCurve {
    /// Create a curve from pre-ordered points.
    pub fn new(points: Vec<EquityPoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].date < w[1].date));
        Self { points }
    }

    /// Append a point. Dates must be strictly ascending.
    pub fn push(&mut self, point: EquityPoint) {
        debug_assert!(self.points.last().is_none_or(|p| p.date < point.date));
        self.points.push(point);
    }

    /// All points in date order.
    pub fn points(&self) -> &[EquityPoint] {
        &self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the curve is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Last point, if any.
    pub fn last(&self) -> Option<&EquityPoint> {
        self.points.last()
    }

    /// Period returns in date order.
    pub fn returns(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.period_return).collect()
    }

    /// Total return from the first to the last point.
    pub fn total_return(&self) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) if first.equity > 0.0 => last.equity / first.equity - 1.0,
            _ => f64::NAN,
        }
    }

    /// Peak-to-trough drawdown per point, as a positive fraction.
    pub fn drawdown_series(&self) -> Vec<f64> {
        let mut peak = f64::MIN;
        self.points
            .iter()
            .map(|p| {
                if p.equity > peak {
                    peak = p.equity;
                }
                if peak > 0.0 { 1.0 - p.equity / peak } else { 0.0 }
            })
            .collect()
    }

    /// Maximum peak-to-trough drawdown over the curve.
    pub fn max_drawdown(&self) -> f64 {
        self.drawdown_series().into_iter().fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn curve(equities: &[f64]) -> EquityCurve {
        let mut c = EquityCurve::default();
        let mut prev = equities[0];
        for (i, &e) in equities.iter().enumerate() {
            c.push(EquityPoint {
                date: day(1 + i as u32),
                equity: e,
                period_return: if i == 0 { 0.0 } else { e / prev - 1.0 },
            });
            prev = e;
        }
        c
    }

    #[test]
    fn total_return_is_last_over_first() {
        let c = curve(&[1.0, 1.1, 1.21]);
        assert_relative_eq!(c.total_return(), 0.21, epsilon = 1e-12);
    }

    #[test]
    fn max_drawdown_tracks_running_peak() {
        let c = curve(&[1.0, 1.2, 0.9, 1.1, 1.3]);
        // peak 1.2, trough 0.9
        assert_relative_eq!(c.max_drawdown(), 1.0 - 0.9 / 1.2, epsilon = 1e-12);
    }

    #[test]
    fn monotone_curve_has_zero_drawdown() {
        let c = curve(&[1.0, 1.05, 1.10, 1.20]);
        assert_relative_eq!(c.max_drawdown(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_curve_is_nan_total_return() {
        let c = EquityCurve::default();
        assert!(c.total_return().is_nan());
        assert!(c.is_empty());
        assert_eq!(c.max_drawdown(), 0.0);
    }
}
