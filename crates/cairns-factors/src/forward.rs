//! Forward return computation.
//!
//! Forward returns are the prediction target for IC estimation and are
//! never used as a tradeable signal. The value for (instrument, date) is
//! realized over the `horizon` periods *after* the date, so it is only
//! safe to consume once the calendar has advanced past `date + horizon`;
//! the scoring model enforces that delay when feeding the weight engines.

use cairns_data::ObservationPanel;

use crate::error::{FactorError, Result};

/// Forward close-to-close returns per (date, instrument).
///
/// `None` for the final `horizon` dates of the calendar and wherever
/// either endpoint close is missing (delistings included).
#[derive(Debug, Clone)]
pub struct ForwardReturns {
    horizon: usize,
    values: Vec<Vec<Option<f64>>>,
}

impl ForwardReturns {
    /// Compute forward returns over `horizon` periods from panel closes.
    pub fn from_panel(panel: &ObservationPanel, horizon: usize) -> Result<Self> {
        if horizon == 0 {
            return Err(FactorError::InvalidParameter(
                "forward-return horizon must be at least 1".to_string(),
            ));
        }
        let n_dates = panel.n_dates();
        let n_inst = panel.n_instruments();
        let mut values = vec![vec![None; n_inst]; n_dates];
        for d in 0..n_dates {
            let Some(future) = d.checked_add(horizon).filter(|&f| f < n_dates) else {
                continue;
            };
            for i in 0..n_inst {
                let (Some(now), Some(then)) = (panel.close(d, i), panel.close(future, i)) else {
                    continue;
                };
                if now > 0.0 {
                    values[d][i] = Some(then / now - 1.0);
                }
            }
        }
        Ok(Self { horizon, values })
    }

    /// The configured horizon in periods.
    pub const fn horizon(&self) -> usize {
        self.horizon
    }

    /// Forward return for (date, instrument).
    pub fn get(&self, date_idx: usize, inst_idx: usize) -> Option<f64> {
        self.values[date_idx][inst_idx]
    }

    /// The full cross-section of forward returns on a date.
    pub fn cross_section(&self, date_idx: usize) -> &[Option<f64>] {
        &self.values[date_idx]
    }
}
