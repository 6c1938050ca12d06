//! The observation panel: (instrument, date) keyed bars and raw factor values.
//!
//! The panel is immutable once built. Dates form a shared trading calendar;
//! the instrument set may vary per date (listings and delistings appear as
//! absent observations). All missing values are `None`, never NaN or zero.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DataError, Result};

/// A single OHLCV bar. Fields that the upstream source could not provide
/// are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Opening price.
    pub open: Option<f64>,
    /// Closing price.
    pub close: Option<f64>,
    /// Traded volume in shares/contracts.
    pub volume: Option<f64>,
}

impl Bar {
    /// Create a bar from fully-known fields.
    pub const fn new(open: f64, close: f64, volume: f64) -> Self {
        Self {
            open: Some(open),
            close: Some(close),
            volume: Some(volume),
        }
    }
}

/// One instrument's record for one date: a bar plus the raw factor values,
/// aligned with the panel's factor-name list.
#[derive(Debug, Clone, PartialEq)]
struct Observation {
    bar: Bar,
    factors: Vec<Option<f64>>,
}

/// Immutable panel of observations keyed by (instrument, date).
///
/// Storage is date-major: for each calendar date there is one slot per
/// interned instrument, `None` when the instrument is not listed that day.
#[derive(Debug, Clone)]
pub struct ObservationPanel {
    calendar: Vec<NaiveDate>,
    instruments: Vec<String>,
    factor_names: Vec<String>,
    grid: Vec<Vec<Option<Observation>>>,
}

impl ObservationPanel {
    /// Start building a panel with the given ordered factor columns.
    pub fn builder<S: Into<String>>(factor_names: Vec<S>) -> PanelBuilder {
        PanelBuilder::new(factor_names)
    }

    /// Number of calendar dates.
    pub fn n_dates(&self) -> usize {
        self.calendar.len()
    }

    /// Number of interned instruments.
    pub fn n_instruments(&self) -> usize {
        self.instruments.len()
    }

    /// Number of factor columns.
    pub fn n_factors(&self) -> usize {
        self.factor_names.len()
    }

    /// The trading calendar in ascending order.
    pub fn calendar(&self) -> &[NaiveDate] {
        &self.calendar
    }

    /// Date label at a calendar index.
    pub fn date(&self, date_idx: usize) -> NaiveDate {
        self.calendar[date_idx]
    }

    /// Calendar index of a date, if present.
    pub fn date_index(&self, date: NaiveDate) -> Option<usize> {
        self.calendar.binary_search(&date).ok()
    }

    /// Interned instrument symbols. Indices into this slice identify
    /// instruments everywhere else in the pipeline.
    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    /// Index of an instrument symbol, if present.
    pub fn instrument_index(&self, symbol: &str) -> Option<usize> {
        self.instruments.iter().position(|s| s == symbol)
    }

    /// Ordered factor column names.
    pub fn factor_names(&self) -> &[String] {
        &self.factor_names
    }

    /// Index of a factor name, if present.
    pub fn factor_index(&self, name: &str) -> Option<usize> {
        self.factor_names.iter().position(|s| s == name)
    }

    /// Whether the instrument has an observation on the date.
    pub fn is_listed(&self, date_idx: usize, inst_idx: usize) -> bool {
        self.grid[date_idx][inst_idx].is_some()
    }

    /// Closing price for (date, instrument).
    pub fn close(&self, date_idx: usize, inst_idx: usize) -> Option<f64> {
        self.grid[date_idx][inst_idx].as_ref().and_then(|o| o.bar.close)
    }

    /// Opening price for (date, instrument).
    pub fn open(&self, date_idx: usize, inst_idx: usize) -> Option<f64> {
        self.grid[date_idx][inst_idx].as_ref().and_then(|o| o.bar.open)
    }

    /// Traded volume for (date, instrument).
    pub fn volume(&self, date_idx: usize, inst_idx: usize) -> Option<f64> {
        self.grid[date_idx][inst_idx].as_ref().and_then(|o| o.bar.volume)
    }

    /// Traded notional (close × volume), used for liquidity eligibility.
    pub fn notional(&self, date_idx: usize, inst_idx: usize) -> Option<f64> {
        let close = self.close(date_idx, inst_idx)?;
        let volume = self.volume(date_idx, inst_idx)?;
        Some(close * volume)
    }

    /// Raw factor value for (date, instrument, factor).
    pub fn factor_value(&self, date_idx: usize, inst_idx: usize, factor_idx: usize) -> Option<f64> {
        self.grid[date_idx][inst_idx]
            .as_ref()
            .and_then(|o| o.factors[factor_idx])
    }

    /// One factor's raw cross-section on a date, aligned with
    /// [`instruments`](Self::instruments).
    pub fn factor_cross_section(&self, date_idx: usize, factor_idx: usize) -> Vec<Option<f64>> {
        (0..self.n_instruments())
            .map(|i| self.factor_value(date_idx, i, factor_idx))
            .collect()
    }

    /// Close-to-close return realized over the period ending at `date_idx`.
    ///
    /// `None` on the first date or when either close is missing.
    pub fn period_return(&self, date_idx: usize, inst_idx: usize) -> Option<f64> {
        if date_idx == 0 {
            return None;
        }
        let prev = self.close(date_idx - 1, inst_idx)?;
        let cur = self.close(date_idx, inst_idx)?;
        if prev <= 0.0 {
            return None;
        }
        Some(cur / prev - 1.0)
    }
}

/// Incremental builder for [`ObservationPanel`].
///
/// Rows must arrive in non-decreasing date order (the input contract from
/// the data-loading collaborator); within a date, instrument order is free.
#[derive(Debug)]
pub struct PanelBuilder {
    factor_names: Vec<String>,
    calendar: Vec<NaiveDate>,
    instruments: Vec<String>,
    instrument_ids: HashMap<String, usize>,
    seen: HashSet<(usize, usize)>,
    rows: Vec<(usize, usize, Observation)>,
}

impl PanelBuilder {
    fn new<S: Into<String>>(factor_names: Vec<S>) -> Self {
        Self {
            factor_names: factor_names.into_iter().map(Into::into).collect(),
            calendar: Vec::new(),
            instruments: Vec::new(),
            instrument_ids: HashMap::new(),
            seen: HashSet::new(),
            rows: Vec::new(),
        }
    }

    /// Append one observation row.
    ///
    /// Non-finite numbers are normalized to `None`. Errors if the date goes
    /// backwards, the (instrument, date) pair repeats, or the number of
    /// factor values does not match the declared factor columns.
    pub fn push(
        &mut self,
        symbol: &str,
        date: NaiveDate,
        bar: Bar,
        factors: &[Option<f64>],
    ) -> Result<()> {
        if factors.len() != self.factor_names.len() {
            return Err(DataError::FactorArity {
                expected: self.factor_names.len(),
                actual: factors.len(),
            });
        }
        if let Some(&latest) = self.calendar.last() {
            if date < latest {
                return Err(DataError::UnsortedDates {
                    symbol: symbol.to_string(),
                    date,
                    latest,
                });
            }
            if date > latest {
                self.calendar.push(date);
            }
        } else {
            self.calendar.push(date);
        }
        let date_idx = self.calendar.len() - 1;

        let inst_idx = match self.instrument_ids.get(symbol) {
            Some(&idx) => idx,
            None => {
                let idx = self.instruments.len();
                self.instruments.push(symbol.to_string());
                self.instrument_ids.insert(symbol.to_string(), idx);
                idx
            }
        };

        if !self.seen.insert((date_idx, inst_idx)) {
            return Err(DataError::DuplicateObservation {
                symbol: symbol.to_string(),
                date,
            });
        }

        let obs = Observation {
            bar: Bar {
                open: sanitize(bar.open),
                close: sanitize(bar.close),
                volume: sanitize(bar.volume),
            },
            factors: factors.iter().map(|v| sanitize(*v)).collect(),
        };
        self.rows.push((date_idx, inst_idx, obs));
        Ok(())
    }

    /// Finalize the panel. Errors if no rows were pushed.
    pub fn finish(self) -> Result<ObservationPanel> {
        if self.rows.is_empty() {
            return Err(DataError::EmptyPanel);
        }
        let n_dates = self.calendar.len();
        let n_instruments = self.instruments.len();
        let mut grid: Vec<Vec<Option<Observation>>> = vec![vec![None; n_instruments]; n_dates];
        for (date_idx, inst_idx, obs) in self.rows {
            grid[date_idx][inst_idx] = Some(obs);
        }
        Ok(ObservationPanel {
            calendar: self.calendar,
            instruments: self.instruments,
            factor_names: self.factor_names,
            grid,
        })
    }
}

fn sanitize(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}
