//! Performance summary: the thin evaluator over the equity curve and
//! trade log.
//!
//! The backtest engine's output contract is the curve and the log; this
//! module derives the headline statistics a research report needs and
//! renders them for terminals and documentation.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::equity::EquityCurve;
use crate::trades::TradeLog;

/// Summary statistics for one backtest run.
///
/// Ratios that are undefined for the input (fewer than two periods, zero
/// dispersion) are NaN rather than silently zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// First date of the simulation.
    pub period_start: Option<NaiveDate>,
    /// Last date of the simulation.
    pub period_end: Option<NaiveDate>,
    /// Total return over the run.
    pub total_return: f64,
    /// Geometrically annualized return.
    pub annualized_return: f64,
    /// Annualized standard deviation of period returns.
    pub annualized_volatility: f64,
    /// Annualized Sharpe ratio (zero risk-free rate).
    pub sharpe_ratio: f64,
    /// Maximum peak-to-trough drawdown, positive fraction.
    pub max_drawdown: f64,
    /// Average absolute weight traded per rebalance.
    pub average_turnover: f64,
    /// Total transaction costs charged, in equity units.
    pub total_costs: f64,
    /// Number of trade records.
    pub n_trades: usize,
    /// Number of simulated periods.
    pub n_periods: usize,
}

impl PerformanceSummary {
    /// Compute a summary from a run's artifacts.
    ///
    /// `periods_per_year` is the annualization basis (252 for daily data).
    pub fn compute(curve: &EquityCurve, trades: &TradeLog, periods_per_year: usize) -> Self {
        let returns = curve.returns();
        let n_periods = returns.len();
        let total_return = curve.total_return();

        let n_years = n_periods as f64 / periods_per_year as f64;
        let annualized_return = if n_years > 0.0 && total_return > -1.0 {
            (1.0 + total_return).powf(1.0 / n_years) - 1.0
        } else {
            f64::NAN
        };

        let annualized_volatility = if n_periods >= 2 {
            let mean = returns.iter().sum::<f64>() / n_periods as f64;
            let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
                / (n_periods - 1) as f64;
            var.sqrt() * (periods_per_year as f64).sqrt()
        } else {
            f64::NAN
        };

        Self {
            period_start: curve.points().first().map(|p| p.date),
            period_end: curve.last().map(|p| p.date),
            total_return,
            annualized_return,
            annualized_volatility,
            sharpe_ratio: sharpe(&returns, periods_per_year),
            max_drawdown: curve.max_drawdown(),
            average_turnover: trades.average_turnover(),
            total_costs: trades.total_cost(),
            n_trades: trades.len(),
            n_periods,
        }
    }

    /// Format as an ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut out = String::new();
        out.push_str("\nBacktest Summary\n");
        if let (Some(start), Some(end)) = (self.period_start, self.period_end) {
            out.push_str(&format!("Period: {start} to {end} ({} periods)\n", self.n_periods));
        }
        out.push_str(&"=".repeat(60));
        out.push('\n');
        out.push_str(&format!(
            "  Total Return:           {:>10.2}%\n",
            self.total_return * 100.0
        ));
        out.push_str(&format!(
            "  Annualized Return:      {:>10.2}%\n",
            self.annualized_return * 100.0
        ));
        out.push_str(&format!(
            "  Annualized Volatility:  {:>10.2}%\n",
            self.annualized_volatility * 100.0
        ));
        out.push_str(&format!("  Sharpe Ratio:           {:>10.2}\n", self.sharpe_ratio));
        out.push_str(&format!(
            "  Max Drawdown:           {:>10.2}%\n",
            self.max_drawdown * 100.0
        ));
        out.push_str(&format!(
            "  Avg Turnover:           {:>10.4}\n",
            self.average_turnover
        ));
        out.push_str(&format!("  Total Costs:            {:>10.4}\n", self.total_costs));
        out.push_str(&format!("  Trades:                 {:>10}\n", self.n_trades));
        out.push_str(&"=".repeat(60));
        out.push('\n');
        out
    }

    /// Format as Markdown for documentation.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Backtest Summary\n\n");
        if let (Some(start), Some(end)) = (self.period_start, self.period_end) {
            out.push_str(&format!(
                "**Period:** {start} to {end} ({} periods)\n\n",
                self.n_periods
            ));
        }
        out.push_str("| Metric | Value |\n|--------|-------|\n");
        out.push_str(&format!("| Total Return | {:.2}% |\n", self.total_return * 100.0));
        out.push_str(&format!(
            "| Annualized Return | {:.2}% |\n",
            self.annualized_return * 100.0
        ));
        out.push_str(&format!(
            "| Annualized Volatility | {:.2}% |\n",
            self.annualized_volatility * 100.0
        ));
        out.push_str(&format!("| Sharpe Ratio | {:.2} |\n", self.sharpe_ratio));
        out.push_str(&format!("| Max Drawdown | {:.2}% |\n", self.max_drawdown * 100.0));
        out.push_str(&format!("| Avg Turnover | {:.4} |\n", self.average_turnover));
        out.push_str(&format!("| Total Costs | {:.4} |\n", self.total_costs));
        out.push_str(&format!("| Trades | {} |\n", self.n_trades));
        out
    }
}

impl fmt::Display for PerformanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Return: {:.2}%", self.total_return * 100.0)?;
        writeln!(f, "Sharpe Ratio: {:.2}", self.sharpe_ratio)?;
        writeln!(f, "Max Drawdown: {:.2}%", self.max_drawdown * 100.0)?;
        Ok(())
    }
}

/// Annualized Sharpe ratio of a return series, zero risk-free rate.
///
/// NaN with fewer than two finite returns or zero dispersion.
pub fn sharpe(returns: &[f64], periods_per_year: usize) -> f64 {
    let valid: Vec<f64> = returns.iter().copied().filter(|r| r.is_finite()).collect();
    if valid.len() < 2 {
        return f64::NAN;
    }
    let mean = valid.iter().sum::<f64>() / valid.len() as f64;
    let var = valid.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (valid.len() - 1) as f64;
    let std = var.sqrt();
    if std == 0.0 {
        f64::NAN
    } else {
        mean / std * (periods_per_year as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equity::EquityPoint;
    use crate::trades::TradeRecord;
    use approx::assert_relative_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn sample_curve() -> EquityCurve {
        let equities = [1.0, 1.01, 0.99, 1.03, 1.05];
        let mut curve = EquityCurve::default();
        let mut prev = equities[0];
        for (i, &e) in equities.iter().enumerate() {
            curve.push(EquityPoint {
                date: day(1 + i as u32),
                equity: e,
                period_return: if i == 0 { 0.0 } else { e / prev - 1.0 },
            });
            prev = e;
        }
        curve
    }

    #[test]
    fn summary_matches_curve_statistics() {
        let mut trades = TradeLog::default();
        trades.push(TradeRecord {
            date: day(1),
            symbol: "AAA".to_string(),
            delta_weight: 1.0,
            cost: 0.001,
        });
        let summary = PerformanceSummary::compute(&sample_curve(), &trades, 252);
        assert_relative_eq!(summary.total_return, 0.05, epsilon = 1e-12);
        assert_relative_eq!(summary.max_drawdown, 1.0 - 0.99 / 1.01, epsilon = 1e-12);
        assert_eq!(summary.n_trades, 1);
        assert_eq!(summary.n_periods, 5);
        assert_relative_eq!(summary.total_costs, 0.001, epsilon = 1e-12);
        assert!(summary.sharpe_ratio.is_finite());
    }

    #[test]
    fn sharpe_sign_follows_mean_return() {
        assert!(sharpe(&[0.01, 0.02, 0.015], 252) > 0.0);
        assert!(sharpe(&[-0.01, -0.02, -0.015], 252) < 0.0);
    }

    #[test]
    fn sharpe_undefined_cases_are_nan() {
        assert!(sharpe(&[], 252).is_nan());
        assert!(sharpe(&[0.01], 252).is_nan());
        assert!(sharpe(&[0.01, 0.01, 0.01], 252).is_nan());
    }

    #[test]
    fn sharpe_scales_with_annualization_basis() {
        let returns = [0.01, -0.005, 0.015, 0.002];
        let ratio = sharpe(&returns, 252) / sharpe(&returns, 12);
        assert_relative_eq!(ratio, (252.0_f64 / 12.0).sqrt(), epsilon = 1e-10);
    }

    #[test]
    fn renderings_contain_headline_numbers() {
        let summary = PerformanceSummary::compute(&sample_curve(), &TradeLog::default(), 252);
        let table = summary.to_ascii_table();
        assert!(table.contains("Total Return"));
        assert!(table.contains("Sharpe"));
        let md = summary.to_markdown();
        assert!(md.contains("# Backtest Summary"));
        assert!(md.contains("| Max Drawdown |"));
        let display = format!("{summary}");
        assert!(display.contains("Total Return"));
    }

    #[test]
    fn empty_run_is_all_nan_not_zero() {
        let summary =
            PerformanceSummary::compute(&EquityCurve::default(), &TradeLog::default(), 252);
        assert!(summary.total_return.is_nan());
        assert!(summary.sharpe_ratio.is_nan());
        assert_eq!(summary.n_periods, 0);
    }
}
