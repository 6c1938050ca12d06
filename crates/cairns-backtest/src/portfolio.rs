//! Portfolio state: holdings, cash and equity.
//!
//! The portfolio is owned exclusively by the backtest engine and mutated
//! only by the date-ordered driver loop. Holdings are portfolio weights;
//! between rebalances they drift with instrument returns (mark-to-market),
//! which is intentional and must not be corrected.

use std::collections::HashMap;

/// Weights below this magnitude are dropped after drift to keep the
/// holdings map from accumulating dust.
const DUST: f64 = 1e-12;

/// Mutable portfolio state for one simulation.
#[derive(Debug, Clone)]
pub struct Portfolio {
    holdings: HashMap<usize, f64>,
    equity: f64,
}

impl Portfolio {
    /// A fresh all-cash portfolio.
    pub fn new(initial_equity: f64) -> Self {
        Self {
            holdings: HashMap::new(),
            equity: initial_equity,
        }
    }

    /// Current equity in currency units.
    pub const fn equity(&self) -> f64 {
        self.equity
    }

    /// Current holdings as instrument-index → weight.
    pub const fn holdings(&self) -> &HashMap<usize, f64> {
        &self.holdings
    }

    /// Weight held in one instrument (zero when absent).
    pub fn weight(&self, inst_idx: usize) -> f64 {
        self.holdings.get(&inst_idx).copied().unwrap_or(0.0)
    }

    /// Weight held in cash: one minus the sum of instrument weights.
    pub fn cash_weight(&self) -> f64 {
        1.0 - self.holdings.values().sum::<f64>()
    }

    /// Mark the portfolio to market over one period.
    ///
    /// `instrument_return` yields each instrument's period return; `None`
    /// (halted or delisted names) contributes zero and the weight is held
    /// flat. Equity compounds by the portfolio return and every weight
    /// drifts to `w * (1 + r) / (1 + r_p)` so the weights keep summing
    /// with cash to one. Returns the portfolio period return.
    pub fn accrue<F>(&mut self, instrument_return: F) -> f64
    where
        F: Fn(usize) -> Option<f64>,
    {
        let portfolio_return: f64 = self
            .holdings
            .iter()
            .map(|(&i, &w)| w * instrument_return(i).unwrap_or(0.0))
            .sum();
        self.equity *= 1.0 + portfolio_return;

        let growth = 1.0 + portfolio_return;
        if growth.abs() > DUST {
            for (&i, w) in self.holdings.iter_mut() {
                let r = instrument_return(i).unwrap_or(0.0);
                *w *= (1.0 + r) / growth;
            }
            self.holdings.retain(|_, w| w.abs() > DUST);
        }
        portfolio_return
    }

    /// Deduct a transaction cost from equity.
    pub fn charge(&mut self, cost: f64) {
        self.equity -= cost;
    }

    /// Replace holdings with the rebalanced target weights.
    pub fn set_holdings(&mut self, targets: HashMap<usize, f64>) {
        self.holdings = targets;
        self.holdings.retain(|_, w| w.abs() > DUST);
    }
}
