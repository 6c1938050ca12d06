//! The append-only trade log produced at each rebalance.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One executed weight change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Rebalance date.
    pub date: NaiveDate,
    /// Instrument symbol.
    pub symbol: String,
    /// Signed change in portfolio weight.
    pub delta_weight: f64,
    /// Transaction cost charged for this change, in equity units.
    pub cost: f64,
}

/// Ordered log of every trade in a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeLog {
    records: Vec<TradeRecord>,
}

impl TradeLog {
    /// Append a record. Rebalance dates arrive in non-decreasing order.
    pub fn push(&mut self, record: TradeRecord) {
        debug_assert!(self.records.last().is_none_or(|r| r.date <= record.date));
        self.records.push(record);
    }

    /// All records in order.
    pub fn records(&self) -> &[TradeRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of all costs charged.
    pub fn total_cost(&self) -> f64 {
        self.records.iter().map(|r| r.cost).sum()
    }

    /// Total absolute weight traded, summed per rebalance date.
    ///
    /// Averaged over the distinct dates that actually traded; rebalances
    /// with zero turnover leave no records and so do not enter the mean.
    pub fn average_turnover(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let total: f64 = self.records.iter().map(|r| r.delta_weight.abs()).sum();
        let mut dates: Vec<NaiveDate> = self.records.iter().map(|r| r.date).collect();
        dates.dedup();
        total / dates.len() as f64
    }
}
