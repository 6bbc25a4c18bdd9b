use crate::data::matrix::ReturnMatrix;
use crate::error::{AllocError, Result};
use crate::types::InstrumentList;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Adjusted closing prices for one instrument, as handed over by whatever
/// fetched them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub display_name: String,
    pub daily_prices: BTreeMap<NaiveDate, f64>,
}

impl PriceHistory {
    pub fn new(display_name: impl Into<String>, daily_prices: BTreeMap<NaiveDate, f64>) -> Self {
        Self {
            display_name: display_name.into(),
            daily_prices,
        }
    }

    pub fn len(&self) -> usize {
        self.daily_prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.daily_prices.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.daily_prices.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.daily_prices.keys().next_back().copied()
    }
}

/// Builds a dated return matrix from per-instrument price histories.
///
/// Only dates present in every history are kept; each row is the growth
/// factor between two consecutive common dates, so the first common date
/// produces no row.
pub fn align_returns(
    instruments: &InstrumentList,
    histories: &HashMap<String, PriceHistory>,
) -> Result<ReturnMatrix> {
    let mut ordered = Vec::with_capacity(instruments.len());
    for symbol in instruments.symbols() {
        let history = histories.get(symbol).ok_or_else(|| {
            AllocError::Input(format!("No price history supplied for {}", symbol))
        })?;
        if let Some((date, price)) = history
            .daily_prices
            .iter()
            .find(|(_, p)| !p.is_finite() || **p <= 0.0)
        {
            return Err(AllocError::Input(format!(
                "{} has a non-positive price {} on {}",
                symbol, price, date
            )));
        }
        ordered.push(history);
    }

    let mut common: BTreeSet<NaiveDate> = ordered[0].daily_prices.keys().copied().collect();
    for history in &ordered[1..] {
        common.retain(|d| history.daily_prices.contains_key(d));
    }

    if common.len() < 2 {
        return Err(AllocError::Input(format!(
            "Price histories share {} common trading day(s); at least 2 are needed",
            common.len()
        )));
    }

    let dates: Vec<NaiveDate> = common.into_iter().collect();
    let mut rows = Vec::with_capacity(dates.len() - 1);
    for window in dates.windows(2) {
        let row: Vec<f64> = ordered
            .iter()
            .map(|h| h.daily_prices[&window[1]] / h.daily_prices[&window[0]])
            .collect();
        rows.push(row);
    }

    let dropped = ordered.iter().map(|h| h.len()).max().unwrap_or(0) - dates.len();
    if dropped > 0 {
        log::warn!(
            "Dropped {} trading day(s) not shared by every instrument; aligned on {} days",
            dropped,
            dates.len()
        );
    }

    ReturnMatrix::new(rows)?.with_dates(dates[1..].to_vec())
}
