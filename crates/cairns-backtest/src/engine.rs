//! The date-by-date backtest driver.
//!
//! The engine owns the portfolio for the duration of a run and advances it
//! strictly in calendar order: accrue the period's mark-to-market return,
//! then — on rebalance dates — select targets from the composite scores,
//! apply drawdown de-risking and position caps, charge costs on turnover
//! and log the trades. Between rebalances holdings drift with prices.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use cairns_data::ObservationPanel;
use cairns_output::{EquityCurve, EquityPoint, TradeLog, TradeRecord};

use crate::cost::CostModel;
use crate::error::{BacktestError, Result};
use crate::portfolio::Portfolio;
use crate::risk::{DrawdownControl, DrawdownTracker};
use crate::selection::{WeightingScheme, cap_weights, select_targets};

/// Weight changes below this magnitude are not logged as trades.
const TRADE_EPSILON: f64 = 1e-12;

/// Backtest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Rebalance every N trading periods (1 = every period).
    pub rebalance_every: usize,
    /// Number of long positions to select.
    pub top_k: usize,
    /// Number of short positions; `None` runs long-only.
    pub bottom_k: Option<usize>,
    /// How weights are apportioned among selected names.
    pub weighting: WeightingScheme,
    /// Maximum absolute weight per instrument, in (0, 1].
    pub max_position_weight: f64,
    /// Proportional transaction cost in basis points on notional traded.
    pub cost_bps: f64,
    /// Minimum daily traded notional (close × volume) for eligibility.
    pub min_volume_notional: Option<f64>,
    /// Optional drawdown-triggered de-risking.
    pub drawdown: Option<DrawdownControl>,
    /// Starting equity in currency units.
    pub initial_equity: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            rebalance_every: 5,
            top_k: 10,
            bottom_k: None,
            weighting: WeightingScheme::EqualWeight,
            max_position_weight: 0.10,
            cost_bps: 10.0,
            min_volume_notional: None,
            drawdown: None,
            initial_equity: 1_000_000.0,
        }
    }
}

/// Artifacts of one simulation run.
#[derive(Debug, Clone)]
pub struct BacktestOutput {
    /// Equity per simulated date, net of costs.
    pub equity: EquityCurve,
    /// Every executed weight change in order.
    pub trades: TradeLog,
}

/// Historical simulation engine.
#[derive(Debug, Clone)]
pub struct BacktestEngine {
    config: BacktestConfig,
    cost: CostModel,
}

impl BacktestEngine {
    /// Create an engine, validating the configuration up front.
    pub fn new(config: BacktestConfig) -> Result<Self> {
        if config.rebalance_every == 0 {
            return Err(BacktestError::InvalidParameter(
                "rebalance frequency must be at least 1".to_string(),
            ));
        }
        if config.top_k == 0 {
            return Err(BacktestError::InvalidParameter(
                "top-k selection size must be at least 1".to_string(),
            ));
        }
        if config.bottom_k == Some(0) {
            return Err(BacktestError::InvalidParameter(
                "bottom-k must be at least 1 when set; use None for long-only".to_string(),
            ));
        }
        if !(config.max_position_weight > 0.0 && config.max_position_weight <= 1.0) {
            return Err(BacktestError::InvalidParameter(format!(
                "maximum position weight must be in (0, 1], got {}",
                config.max_position_weight
            )));
        }
        if !(config.initial_equity > 0.0) || !config.initial_equity.is_finite() {
            return Err(BacktestError::InvalidParameter(format!(
                "initial equity must be positive, got {}",
                config.initial_equity
            )));
        }
        if let Some(notional) = config.min_volume_notional {
            if !(notional >= 0.0) {
                return Err(BacktestError::InvalidParameter(format!(
                    "minimum volume notional must be non-negative, got {notional}"
                )));
            }
        }
        if let Some(control) = &config.drawdown {
            control.validate()?;
        }
        let cost = CostModel::from_bps(config.cost_bps)?;
        Ok(Self { config, cost })
    }

    /// The active configuration.
    pub const fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Simulate the score series against the panel.
    ///
    /// `scores[d][i]` is instrument `i`'s composite score on calendar date
    /// `d`; `None` means unscored and therefore ineligible. The run covers
    /// every panel date; rebalances happen on ordinal multiples of the
    /// configured frequency. A rebalance with no eligible instruments
    /// moves the portfolio to cash for the period — it is not an error.
    pub fn run(
        &self,
        panel: &ObservationPanel,
        scores: &[Vec<Option<f64>>],
    ) -> Result<BacktestOutput> {
        let n_dates = panel.n_dates();
        let n_instruments = panel.n_instruments();
        if scores.len() != n_dates {
            return Err(BacktestError::DimensionMismatch {
                expected: n_dates,
                actual: scores.len(),
            });
        }

        let mut portfolio = Portfolio::new(self.config.initial_equity);
        let mut tracker = DrawdownTracker::new();
        let mut curve = EquityCurve::default();
        let mut trades = TradeLog::default();

        for d in 0..n_dates {
            let cross_section = &scores[d];
            if cross_section.len() != n_instruments {
                return Err(BacktestError::DimensionMismatch {
                    expected: n_instruments,
                    actual: cross_section.len(),
                });
            }

            let equity_open = portfolio.equity();
            if d > 0 {
                portfolio.accrue(|i| panel.period_return(d, i));
            }
            tracker.observe(portfolio.equity());

            if d % self.config.rebalance_every == 0 {
                self.rebalance(panel, d, cross_section, &mut portfolio, &tracker, &mut trades);
            }

            let equity_close = portfolio.equity();
            curve.push(EquityPoint {
                date: panel.date(d),
                equity: equity_close,
                period_return: if equity_open > 0.0 {
                    equity_close / equity_open - 1.0
                } else {
                    0.0
                },
            });
        }

        Ok(BacktestOutput { equity: curve, trades })
    }

    fn rebalance(
        &self,
        panel: &ObservationPanel,
        date_idx: usize,
        scores: &[Option<f64>],
        portfolio: &mut Portfolio,
        tracker: &DrawdownTracker,
        trades: &mut TradeLog,
    ) {
        let eligible: Vec<bool> = (0..panel.n_instruments())
            .map(|i| match self.config.min_volume_notional {
                Some(min) => panel.notional(date_idx, i).is_some_and(|n| n >= min),
                None => true,
            })
            .collect();

        let mut targets = select_targets(
            scores,
            &eligible,
            self.config.top_k,
            self.config.bottom_k,
            self.config.weighting,
        );

        if let Some(control) = &self.config.drawdown {
            if tracker.drawdown(portfolio.equity()) > control.threshold {
                for (_, w) in targets.iter_mut() {
                    *w *= control.derisk_factor;
                }
            }
        }
        cap_weights(&mut targets, self.config.max_position_weight);

        let target_map: HashMap<usize, f64> = targets.into_iter().collect();
        let turnover = CostModel::turnover(portfolio.holdings(), &target_map);
        if turnover > 0.0 {
            let equity_before = portfolio.equity();
            portfolio.charge(self.cost.cost(turnover, equity_before));

            let date = panel.date(date_idx);
            let mut deltas: Vec<(usize, f64)> = target_map
                .iter()
                .map(|(&i, &w)| (i, w - portfolio.weight(i)))
                .chain(
                    portfolio
                        .holdings()
                        .iter()
                        .filter(|(i, _)| !target_map.contains_key(*i))
                        .map(|(&i, &w)| (i, -w)),
                )
                .filter(|(_, delta)| delta.abs() > TRADE_EPSILON)
                .collect();
            deltas.sort_by_key(|&(i, _)| i);
            for (i, delta) in deltas {
                trades.push(TradeRecord {
                    date,
                    symbol: panel.instruments()[i].clone(),
                    delta_weight: delta,
                    cost: delta.abs() * self.cost.rate() * equity_before,
                });
            }
        }
        portfolio.set_holdings(target_map);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cairns_data::Bar;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap() + chrono::Days::new(u64::from(d))
    }

    /// Panel of `closes[instrument][date]` with unit volume.
    fn panel_from_closes(closes: &[Vec<f64>]) -> ObservationPanel {
        let n_dates = closes[0].len();
        let mut b = ObservationPanel::builder(vec!["f"]);
        for d in 0..n_dates {
            for (i, series) in closes.iter().enumerate() {
                let c = series[d];
                b.push(
                    &format!("I{i}"),
                    day(d as u32),
                    Bar::new(c, c, 1_000_000.0),
                    &[Some(0.0)],
                )
                .unwrap();
            }
        }
        b.finish().unwrap()
    }

    fn config_for_test() -> BacktestConfig {
        BacktestConfig {
            rebalance_every: 1,
            top_k: 1,
            bottom_k: None,
            weighting: WeightingScheme::EqualWeight,
            max_position_weight: 1.0,
            cost_bps: 0.0,
            min_volume_notional: None,
            drawdown: None,
            initial_equity: 1.0,
        }
    }

    fn constant_scores(
        per_instrument: &[Option<f64>],
        n_dates: usize,
    ) -> Vec<Vec<Option<f64>>> {
        (0..n_dates).map(|_| per_instrument.to_vec()).collect()
    }

    #[test]
    fn unscored_dates_stay_in_cash() {
        let panel = panel_from_closes(&[vec![100.0, 110.0, 121.0], vec![50.0, 45.0, 40.5]]);
        let scores = constant_scores(&[None, None], 3);
        let engine = BacktestEngine::new(config_for_test()).unwrap();
        let out = engine.run(&panel, &scores).unwrap();
        assert!(out.trades.is_empty());
        for point in out.equity.points() {
            assert_relative_eq!(point.equity, 1.0, epsilon = 1e-12);
            assert_relative_eq!(point.period_return, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn top_scored_instrument_drives_equity() {
        // instrument 0 compounds at 10% per period and always scores best
        let panel = panel_from_closes(&[vec![100.0, 110.0, 121.0], vec![50.0, 50.0, 50.0]]);
        let scores = constant_scores(&[Some(1.0), Some(-1.0)], 3);
        let engine = BacktestEngine::new(config_for_test()).unwrap();
        let out = engine.run(&panel, &scores).unwrap();
        let equities: Vec<f64> = out.equity.points().iter().map(|p| p.equity).collect();
        assert_relative_eq!(equities[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(equities[1], 1.1, epsilon = 1e-12);
        assert_relative_eq!(equities[2], 1.21, epsilon = 1e-12);
        // single entry trade on the first date
        assert_eq!(out.trades.len(), 1);
        assert_eq!(out.trades.records()[0].symbol, "I0");
        assert_relative_eq!(out.trades.records()[0].delta_weight, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_turnover_charges_zero_cost() {
        let panel = panel_from_closes(&[vec![100.0; 4], vec![50.0; 4]]);
        let scores = constant_scores(&[Some(1.0), Some(0.0)], 4);
        let mut config = config_for_test();
        config.cost_bps = 50.0;
        let engine = BacktestEngine::new(config).unwrap();
        let out = engine.run(&panel, &scores).unwrap();
        // one entry trade, then identical targets every day after
        assert_eq!(out.trades.len(), 1);
        let entry_cost = out.trades.records()[0].cost;
        assert_relative_eq!(entry_cost, 1.0 * 0.005, epsilon = 1e-12);
        assert_relative_eq!(out.trades.total_cost(), entry_cost, epsilon = 1e-12);
    }

    #[test]
    fn transaction_costs_reduce_equity() {
        let panel = panel_from_closes(&[vec![100.0, 100.0], vec![50.0, 50.0]]);
        let scores = constant_scores(&[Some(1.0), Some(0.0)], 2);
        let mut config = config_for_test();
        config.cost_bps = 100.0; // 1% per unit turnover
        let engine = BacktestEngine::new(config).unwrap();
        let out = engine.run(&panel, &scores).unwrap();
        // full entry at date 0 costs 1% of equity
        assert_relative_eq!(out.equity.points()[0].equity, 0.99, epsilon = 1e-12);
        assert_relative_eq!(out.equity.points()[0].period_return, -0.01, epsilon = 1e-12);
    }

    #[test]
    fn drawdown_breach_scales_next_targets_by_derisk_factor() {
        // held instrument falls 30% against a 20% threshold
        let closes0 = vec![100.0, 90.0, 80.0, 70.0, 70.0, 70.0];
        let closes1 = vec![50.0; 6];
        let panel = panel_from_closes(&[closes0, closes1]);
        let scores = constant_scores(&[Some(1.0), Some(0.0)], 6);
        let mut config = config_for_test();
        config.rebalance_every = 4;
        config.drawdown = Some(DrawdownControl {
            threshold: 0.20,
            derisk_factor: 0.5,
        });
        let engine = BacktestEngine::new(config).unwrap();
        let out = engine.run(&panel, &scores).unwrap();

        // equity bottoms at 0.7 of the starting peak
        assert_relative_eq!(out.equity.points()[3].equity, 0.7, epsilon = 1e-12);
        // at date 4 the unscaled target (1.0) is halved; the only holding
        // is trimmed from 1.0 to 0.5
        let trade = out
            .trades
            .records()
            .iter()
            .find(|t| t.date == day(4))
            .expect("de-risking trade");
        assert_eq!(trade.symbol, "I0");
        assert_relative_eq!(trade.delta_weight, -0.5, epsilon = 1e-12);
    }

    #[test]
    fn liquidity_filter_excludes_thin_names() {
        // instrument 0 scores best but trades almost no notional
        let mut b = ObservationPanel::builder(vec!["f"]);
        for d in 0..2u32 {
            b.push("THIN", day(d), Bar::new(100.0, 100.0, 10.0), &[Some(0.0)]).unwrap();
            b.push("DEEP", day(d), Bar::new(50.0, 50.0, 1_000_000.0), &[Some(0.0)]).unwrap();
        }
        let panel = b.finish().unwrap();
        let scores = constant_scores(&[Some(2.0), Some(1.0)], 2);
        let mut config = config_for_test();
        config.min_volume_notional = Some(1_000_000.0);
        let engine = BacktestEngine::new(config).unwrap();
        let out = engine.run(&panel, &scores).unwrap();
        assert_eq!(out.trades.records()[0].symbol, "DEEP");
    }

    #[test]
    fn long_short_mode_holds_both_tails() {
        let panel = panel_from_closes(&[
            vec![100.0, 110.0],
            vec![50.0, 50.0],
            vec![20.0, 18.0],
        ]);
        let scores = constant_scores(&[Some(1.0), Some(0.0), Some(-1.0)], 2);
        let mut config = config_for_test();
        config.bottom_k = Some(1);
        let engine = BacktestEngine::new(config).unwrap();
        let out = engine.run(&panel, &scores).unwrap();
        // long the winner (+10%), short the loser (-10%): both legs gain
        assert_relative_eq!(
            out.equity.points()[1].equity,
            1.0 * (1.0 + 0.10 + 0.10),
            epsilon = 1e-12
        );
    }

    #[test]
    fn position_caps_leave_excess_in_cash() {
        let panel = panel_from_closes(&[vec![100.0, 110.0], vec![50.0, 50.0]]);
        let scores = constant_scores(&[Some(1.0), Some(0.5)], 2);
        let mut config = config_for_test();
        config.top_k = 1;
        config.max_position_weight = 0.25;
        let engine = BacktestEngine::new(config).unwrap();
        let out = engine.run(&panel, &scores).unwrap();
        // 25% of the book earns 10%; the rest sits in cash
        assert_relative_eq!(out.equity.points()[1].equity, 1.025, epsilon = 1e-12);
    }

    #[test]
    fn score_series_must_match_panel_shape() {
        let panel = panel_from_closes(&[vec![100.0, 110.0]]);
        let engine = BacktestEngine::new(config_for_test()).unwrap();
        let err = engine.run(&panel, &[]).unwrap_err();
        assert!(matches!(err, BacktestError::DimensionMismatch { .. }));
    }

    #[test]
    fn invalid_configs_fail_fast() {
        let cases = [
            BacktestConfig {
                rebalance_every: 0,
                ..BacktestConfig::default()
            },
            BacktestConfig {
                top_k: 0,
                ..BacktestConfig::default()
            },
            BacktestConfig {
                bottom_k: Some(0),
                ..BacktestConfig::default()
            },
            BacktestConfig {
                max_position_weight: 0.0,
                ..BacktestConfig::default()
            },
            BacktestConfig {
                max_position_weight: 1.5,
                ..BacktestConfig::default()
            },
            BacktestConfig {
                cost_bps: -5.0,
                ..BacktestConfig::default()
            },
            BacktestConfig {
                initial_equity: 0.0,
                ..BacktestConfig::default()
            },
            BacktestConfig {
                drawdown: Some(DrawdownControl {
                    threshold: 2.0,
                    derisk_factor: 0.5,
                }),
                ..BacktestConfig::default()
            },
        ];
        for config in cases {
            assert!(BacktestEngine::new(config).is_err());
        }
    }
}
