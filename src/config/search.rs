use super::traits::ConfigSection;
use crate::error::AllocError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Target daily growth factor (1.0002 is roughly 5% a year).
    pub required_return: f64,
    /// Smallest trade size searched, as a fraction of capital.
    pub min_step: f64,
    pub use_downside_correl: bool,
    /// Scoring threads; 0 means one per core.
    pub num_workers: usize,
    pub degenerate_correlation: DegenerateCorrelation,
}

/// What to do when the downside correlation has fewer than two bad days to
/// work with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateCorrelation {
    /// Abort the search with a numeric error.
    Fail,
    /// Treat the correlation penalty as 1.
    Neutral,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            required_return: 1.0,
            min_step: 1.0 / 128.0,
            use_downside_correl: true,
            num_workers: 0,
            degenerate_correlation: DegenerateCorrelation::Fail,
        }
    }
}

impl SearchConfig {
    /// Upper bound on "no improvement" rounds before the step drops below
    /// `min_step`.
    pub fn max_halvings(&self) -> usize {
        (1.0 / self.min_step).log2().floor() as usize + 1
    }
}

impl ConfigSection for SearchConfig {
    fn section_name() -> &'static str {
        "search"
    }

    fn validate(&self) -> Result<(), AllocError> {
        if !self.required_return.is_finite() || self.required_return <= 0.0 {
            return Err(AllocError::Configuration(
                "Required return must be a positive daily growth factor".to_string()
            ));
        }
        if !self.min_step.is_finite() || self.min_step <= 0.0 || self.min_step > 1.0 {
            return Err(AllocError::Configuration(
                "Minimum step must be in (0, 1]".to_string()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SearchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_step, 0.0078125);
    }

    #[test]
    fn test_max_halvings() {
        let mut config = SearchConfig::default();
        assert_eq!(config.max_halvings(), 8);

        config.min_step = 0.01;
        assert_eq!(config.max_halvings(), 7);

        config.min_step = 1.0;
        assert_eq!(config.max_halvings(), 1);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = SearchConfig::default();
        config.min_step = 0.0;
        assert!(config.validate().is_err());

        let mut config = SearchConfig::default();
        config.required_return = -1.0;
        assert!(config.validate().is_err());
    }
}
