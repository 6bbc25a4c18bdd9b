use crate::error::{AllocError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Tolerance used when checking that an allocation is fully invested.
pub const ALLOCATION_TOLERANCE: f64 = 1e-9;

/// Ordered, distinct instrument symbols. Position `i` binds return-matrix
/// column `i`, allocation entry `i` and expense entry `i` together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentList(Vec<String>);

impl InstrumentList {
    pub fn new(symbols: Vec<String>) -> Result<Self> {
        if symbols.is_empty() {
            return Err(AllocError::Input(
                "Instrument list must contain at least one symbol".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(symbols.len());
        for symbol in &symbols {
            if symbol.trim().is_empty() {
                return Err(AllocError::Input("Instrument symbol must not be empty".to_string()));
            }
            if !seen.insert(symbol.as_str()) {
                return Err(AllocError::Input(format!("Duplicate instrument symbol: {}", symbol)));
            }
        }

        Ok(Self(symbols))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn symbols(&self) -> &[String] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn position(&self, symbol: &str) -> Option<usize> {
        self.0.iter().position(|s| s == symbol)
    }
}

/// Annualized expense ratio per instrument, as a fraction (0.0003 = 3bp).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseVector(Vec<f64>);

impl ExpenseVector {
    pub fn new(ratios: Vec<f64>) -> Result<Self> {
        for (i, &ratio) in ratios.iter().enumerate() {
            if !ratio.is_finite() || !(0.0..1.0).contains(&ratio) {
                return Err(AllocError::Input(format!(
                    "Expense ratio at position {} must be in [0, 1), got {}",
                    i, ratio
                )));
            }
        }
        Ok(Self(ratios))
    }

    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Fraction of capital per instrument. Non-negative, sums to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationVector(Vec<f64>);

impl AllocationVector {
    /// Validates weights: same length as the universe is checked by the
    /// scorer, here only sign, finiteness and the full-investment sum.
    pub fn new(weights: Vec<f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(AllocError::Input("Allocation must not be empty".to_string()));
        }
        if let Some((i, w)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(AllocError::Input(format!(
                "Allocation weight at position {} must be a non-negative number, got {}",
                i, w
            )));
        }
        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > ALLOCATION_TOLERANCE {
            return Err(AllocError::Input(format!(
                "Allocation must sum to 1.0, got {}",
                total
            )));
        }
        Ok(Self(weights))
    }

    /// Everything in the first instrument.
    pub fn seed(len: usize) -> Self {
        let mut weights = vec![0.0; len];
        if let Some(first) = weights.first_mut() {
            *first = 1.0;
        }
        Self(weights)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn weight(&self, index: usize) -> f64 {
        self.0.get(index).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn is_fully_invested(&self) -> bool {
        self.0.iter().all(|&w| w >= 0.0) && (self.total() - 1.0).abs() <= ALLOCATION_TOLERANCE
    }

    /// Number of instruments holding a nonzero weight.
    pub fn active_count(&self) -> usize {
        self.0.iter().filter(|&&w| w > 0.0).count()
    }

    /// Moves `amount` of capital from `sell` to `buy`. Callers guarantee
    /// `weight(sell) >= amount`.
    pub(crate) fn transfer(&self, sell: usize, buy: usize, amount: f64) -> Self {
        let mut weights = self.0.clone();
        weights[sell] -= amount;
        if weights[sell].abs() < 1e-12 {
            weights[sell] = 0.0;
        }
        weights[buy] += amount;
        Self(weights)
    }

    /// Nonzero positions paired with their symbols, in canonical order.
    pub fn sparse(&self, instruments: &InstrumentList) -> Vec<(String, f64)> {
        instruments
            .symbols()
            .iter()
            .zip(&self.0)
            .filter(|(_, w)| **w > 0.0)
            .map(|(s, &w)| (s.clone(), w))
            .collect()
    }
}

/// One scorer evaluation. Never mutated, only compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: f64,
    pub allocation: AllocationVector,
}

/// Final answer of a completed search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub score: f64,
    pub allocation: AllocationVector,
    pub instruments: InstrumentList,
    pub rounds: usize,
    pub halvings: usize,
}

impl SearchOutcome {
    pub fn by_instrument(&self) -> HashMap<String, f64> {
        self.instruments
            .symbols()
            .iter()
            .cloned()
            .zip(self.allocation.as_slice().iter().copied())
            .collect()
    }

    pub fn sparse(&self) -> Vec<(String, f64)> {
        self.allocation.sparse(&self.instruments)
    }
}
