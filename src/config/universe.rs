use super::traits::ConfigSection;
use crate::error::{AllocError, Result};
use crate::types::{ExpenseVector, InstrumentList};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseConfig {
    /// Directory holding one `<SYMBOL>.csv` per instrument.
    pub data_dir: PathBuf,
    pub instruments: Vec<InstrumentConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub expense_ratio: f64,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            instruments: Vec::new(),
        }
    }
}

impl UniverseConfig {
    /// Symbols in configuration order, which is the canonical column order.
    pub fn instrument_list(&self) -> Result<InstrumentList> {
        InstrumentList::new(self.instruments.iter().map(|i| i.symbol.clone()).collect())
    }

    pub fn expense_vector(&self) -> Result<ExpenseVector> {
        ExpenseVector::new(self.instruments.iter().map(|i| i.expense_ratio).collect())
    }
}

impl ConfigSection for UniverseConfig {
    fn section_name() -> &'static str {
        "universe"
    }

    fn validate(&self) -> Result<()> {
        if self.instruments.is_empty() {
            return Err(AllocError::Configuration(
                "At least one instrument must be configured".to_string()
            ));
        }

        let mut seen = HashSet::new();
        for instrument in &self.instruments {
            if !seen.insert(instrument.symbol.as_str()) {
                return Err(AllocError::Configuration(format!(
                    "Instrument {} is configured twice",
                    instrument.symbol
                )));
            }
            if !(0.0..1.0).contains(&instrument.expense_ratio) {
                return Err(AllocError::Configuration(format!(
                    "Expense ratio for {} must be in [0, 1)",
                    instrument.symbol
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instrument(symbol: &str, expense_ratio: f64) -> InstrumentConfig {
        InstrumentConfig {
            symbol: symbol.to_string(),
            name: None,
            expense_ratio,
        }
    }

    #[test]
    fn test_empty_universe_rejected() {
        assert!(UniverseConfig::default().validate().is_err());
    }

    #[test]
    fn test_duplicate_symbol_rejected() {
        let universe = UniverseConfig {
            instruments: vec![instrument("VTI", 0.0003), instrument("VTI", 0.0003)],
            ..Default::default()
        };
        assert!(universe.validate().is_err());
    }

    #[test]
    fn test_vectors_follow_config_order() {
        let universe = UniverseConfig {
            instruments: vec![instrument("VXUS", 0.0007), instrument("BND", 0.0003)],
            ..Default::default()
        };
        assert!(universe.validate().is_ok());
        assert_eq!(universe.instrument_list().unwrap().symbols(), &["VXUS", "BND"]);
        assert_eq!(universe.expense_vector().unwrap().as_slice(), &[0.0007, 0.0003]);
    }
}
