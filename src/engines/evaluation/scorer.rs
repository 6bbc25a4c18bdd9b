use crate::{
    config::{DegenerateCorrelation, SearchConfig},
    data::MarketData,
    engines::metrics::RiskMetrics,
    error::{AllocError, Result},
    types::{AllocationVector, ScoreResult},
};
use std::sync::Arc;

/// Trading days used to amortize an annual expense ratio.
pub const TRADING_DAYS_PER_YEAR: f64 = 253.0;

/// Smallest risk denominator. A target-beating allocation with no downside
/// scores `excess / RISKLESS_FLOOR`; an allocation that exactly meets the
/// target with no downside scores 0.
pub const RISKLESS_FLOOR: f64 = 1e-9;

/// Relative distance from the target within which a day counts as exactly
/// on target. Covers rounding in the weighted sum and the expense drag.
pub const ON_TARGET_TOLERANCE: f64 = 1e-12;

/// The scoring knobs that stay fixed for a whole search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringParams {
    pub required_return: f64,
    pub use_downside_correl: bool,
    pub degenerate_correlation: DegenerateCorrelation,
}

impl From<&SearchConfig> for ScoringParams {
    fn from(config: &SearchConfig) -> Self {
        Self {
            required_return: config.required_return,
            use_downside_correl: config.use_downside_correl,
            degenerate_correlation: config.degenerate_correlation,
        }
    }
}

/// Intermediate quantities of one evaluation.
///
/// `downside_risk` and `downside_correl` are `None` when the mean return
/// misses the target and the score short-circuits.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub mean_return: f64,
    pub downside_risk: Option<f64>,
    pub downside_correl: Option<f64>,
    pub score: f64,
}

impl ScoreBreakdown {
    pub fn short_circuited(&self) -> bool {
        self.downside_risk.is_none()
    }
}

/// Modified Sortino ratio of an allocation over a fixed return history.
pub struct AllocationScorer {
    market: Arc<MarketData>,
    params: ScoringParams,
}

impl AllocationScorer {
    pub fn new(market: Arc<MarketData>, params: ScoringParams) -> Self {
        Self { market, params }
    }

    pub fn market(&self) -> &MarketData {
        &self.market
    }

    pub fn params(&self) -> &ScoringParams {
        &self.params
    }

    pub fn score(&self, allocation: &AllocationVector) -> Result<ScoreResult> {
        let breakdown = self.breakdown(allocation)?;
        Ok(ScoreResult {
            score: breakdown.score,
            allocation: allocation.clone(),
        })
    }

    pub fn breakdown(&self, allocation: &AllocationVector) -> Result<ScoreBreakdown> {
        let weights = allocation.as_slice();
        if weights.len() != self.market.num_instruments() {
            return Err(AllocError::Input(format!(
                "Allocation has {} weights but the universe has {} instruments",
                weights.len(),
                self.market.num_instruments()
            )));
        }

        let required = self.params.required_return;
        let daily_returns = self.adjusted_returns(weights);
        let mean_return = RiskMetrics::geometric_mean(&daily_returns)?;
        let excess = mean_return - required;

        // Every day exactly on target: no excess and no downside, scored 0.
        if daily_returns.iter().all(|&r| (r - required).abs() <= ON_TARGET_TOLERANCE * required) {
            return Ok(ScoreBreakdown {
                mean_return,
                downside_risk: Some(0.0),
                downside_correl: None,
                score: 0.0,
            });
        }

        // A negative numerator would reward a larger denominator, so missing
        // the target is scored by the shortfall alone.
        if mean_return < required {
            return Ok(ScoreBreakdown {
                mean_return,
                downside_risk: None,
                downside_correl: None,
                score: excess,
            });
        }

        let downside_risk = RiskMetrics::downside_deviation(&daily_returns, required);
        if downside_risk == 0.0 {
            return Ok(ScoreBreakdown {
                mean_return,
                downside_risk: Some(0.0),
                downside_correl: None,
                score: excess / RISKLESS_FLOOR,
            });
        }

        let downside_correl = if self.params.use_downside_correl && allocation.active_count() > 1 {
            self.downside_correlation(weights, &daily_returns)?
        } else {
            1.0
        };

        let denominator = downside_risk * downside_correl;
        if denominator.is_nan() {
            return Err(AllocError::Numeric(format!(
                "Downside denominator is undefined (risk {}, correlation {})",
                downside_risk, downside_correl
            )));
        }

        let score = excess / denominator.max(RISKLESS_FLOOR);
        if !score.is_finite() {
            return Err(AllocError::Numeric(format!(
                "Score is not finite: excess {} over denominator {}",
                excess, denominator
            )));
        }

        Ok(ScoreBreakdown {
            mean_return,
            downside_risk: Some(downside_risk),
            downside_correl: Some(downside_correl),
            score,
        })
    }

    /// Portfolio growth per day, net of the amortized expense drag.
    fn adjusted_returns(&self, weights: &[f64]) -> Vec<f64> {
        let expense: f64 = weights
            .iter()
            .zip(self.market.expenses().as_slice())
            .map(|(w, e)| w * e)
            .sum();
        let drag = (1.0 - expense).powf(1.0 / TRADING_DAYS_PER_YEAR);

        let mut daily_returns = self.market.returns().portfolio_returns(weights);
        for r in daily_returns.iter_mut() {
            *r *= drag;
        }
        daily_returns
    }

    /// `a' C a` where `C` correlates the raw instrument returns on the days
    /// the portfolio missed the target.
    fn downside_correlation(&self, weights: &[f64], daily_returns: &[f64]) -> Result<f64> {
        let required = self.params.required_return;
        let returns = self.market.returns();
        let bad_days: Vec<&[f64]> = daily_returns
            .iter()
            .enumerate()
            .filter(|(_, &r)| r < required)
            .map(|(day, _)| returns.row(day))
            .collect();

        if bad_days.len() < 2 {
            return match self.params.degenerate_correlation {
                DegenerateCorrelation::Fail => Err(AllocError::Numeric(format!(
                    "Downside correlation needs at least 2 days below target, found {}",
                    bad_days.len()
                ))),
                DegenerateCorrelation::Neutral => Ok(1.0),
            };
        }

        let corr = RiskMetrics::correlation_matrix(&bad_days, weights.len());
        Ok(RiskMetrics::quadratic_form(weights, &corr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ReturnMatrix;
    use crate::types::{ExpenseVector, InstrumentList};

    fn market(rows: Vec<Vec<f64>>, expenses: Vec<f64>) -> Arc<MarketData> {
        let symbols = (0..rows[0].len()).map(|i| format!("I{}", i)).collect();
        Arc::new(
            MarketData::new(
                InstrumentList::new(symbols).unwrap(),
                ReturnMatrix::new(rows).unwrap(),
                ExpenseVector::new(expenses).unwrap(),
            )
            .unwrap(),
        )
    }

    fn params(required_return: f64, use_downside_correl: bool) -> ScoringParams {
        ScoringParams {
            required_return,
            use_downside_correl,
            degenerate_correlation: DegenerateCorrelation::Fail,
        }
    }

    #[test]
    fn test_short_circuit_below_target() {
        let scorer = AllocationScorer::new(
            market(vec![vec![0.99], vec![1.00], vec![0.98]], vec![0.0]),
            params(1.0, true),
        );
        let breakdown = scorer.breakdown(&AllocationVector::seed(1)).unwrap();

        assert!(breakdown.short_circuited());
        assert_eq!(breakdown.score, breakdown.mean_return - 1.0);
        assert!(breakdown.score < 0.0);
    }

    #[test]
    fn test_sortino_without_correlation() {
        let rows = vec![vec![1.03], vec![0.99], vec![1.02], vec![0.98]];
        let scorer = AllocationScorer::new(market(rows.clone(), vec![0.0]), params(1.0, false));
        let breakdown = scorer.breakdown(&AllocationVector::seed(1)).unwrap();

        let flat: Vec<f64> = rows.iter().map(|r| r[0]).collect();
        let mean = RiskMetrics::geometric_mean(&flat).unwrap();
        let risk = RiskMetrics::downside_deviation(&flat, 1.0);
        assert!((breakdown.score - (mean - 1.0) / risk).abs() < 1e-9);
        assert_eq!(breakdown.downside_correl, Some(1.0));
    }

    #[test]
    fn test_expense_drag_lowers_mean() {
        let rows = vec![vec![1.01], vec![1.00], vec![1.01]];
        let cheap = AllocationScorer::new(market(rows.clone(), vec![0.0]), params(0.5, false));
        let costly = AllocationScorer::new(market(rows, vec![0.10]), params(0.5, false));

        let seed = AllocationVector::seed(1);
        let cheap_mean = cheap.breakdown(&seed).unwrap().mean_return;
        let costly_mean = costly.breakdown(&seed).unwrap().mean_return;

        let expected = cheap_mean * 0.9f64.powf(1.0 / TRADING_DAYS_PER_YEAR);
        assert!((costly_mean - expected).abs() < 1e-12);
    }

    #[test]
    fn test_zero_risk_uses_floor() {
        let scorer = AllocationScorer::new(
            market(vec![vec![1.02]; 5], vec![0.0]),
            params(1.01, true),
        );
        let breakdown = scorer.breakdown(&AllocationVector::seed(1)).unwrap();
        assert_eq!(breakdown.downside_risk, Some(0.0));
        assert!((breakdown.score - (breakdown.mean_return - 1.01) / RISKLESS_FLOOR).abs() < 1e-3);
    }

    #[test]
    fn test_exactly_on_target_scores_zero() {
        let scorer = AllocationScorer::new(
            market(vec![vec![1.0, 1.0]; 4], vec![0.0, 0.0]),
            params(1.0, true),
        );
        let allocation = AllocationVector::new(vec![0.5, 0.5]).unwrap();
        let breakdown = scorer.breakdown(&allocation).unwrap();
        assert_eq!(breakdown.mean_return, 1.0);
        assert_eq!(breakdown.downside_risk, Some(0.0));
        assert_eq!(breakdown.score, 0.0);
    }

    #[test]
    fn test_constant_series_on_target_scores_zero() {
        let value = 0.9916892262286862;
        let scorer = AllocationScorer::new(
            market(vec![vec![value, value]; 253], vec![0.0, 0.0]),
            params(value, true),
        );

        for weights in [vec![1.0, 0.0], vec![0.75, 0.25], vec![0.5, 0.5]] {
            let breakdown = scorer.breakdown(&AllocationVector::new(weights).unwrap()).unwrap();
            assert!(!breakdown.short_circuited());
            assert_eq!(breakdown.score, 0.0);
        }
    }

    #[test]
    fn test_single_bad_day_policy() {
        let rows = vec![vec![1.05, 1.04], vec![0.97, 0.98], vec![1.03, 1.02]];
        let allocation = AllocationVector::new(vec![0.5, 0.5]).unwrap();

        let failing =
            AllocationScorer::new(market(rows.clone(), vec![0.0, 0.0]), params(1.0, true));
        assert!(matches!(failing.breakdown(&allocation), Err(AllocError::Numeric(_))));

        let mut neutral_params = params(1.0, true);
        neutral_params.degenerate_correlation = DegenerateCorrelation::Neutral;
        let neutral = AllocationScorer::new(market(rows, vec![0.0, 0.0]), neutral_params);
        assert_eq!(neutral.breakdown(&allocation).unwrap().downside_correl, Some(1.0));
    }

    #[test]
    fn test_correlation_penalizes_comovement() {
        // Both instruments fall together on the bad days
        let together = vec![
            vec![1.04, 1.04],
            vec![0.98, 0.97],
            vec![1.03, 1.03],
            vec![0.99, 0.98],
            vec![1.02, 1.03],
        ];
        // They offset each other on the bad days
        let offset = vec![
            vec![1.04, 1.04],
            vec![0.96, 1.01],
            vec![1.03, 1.03],
            vec![1.01, 0.96],
            vec![1.02, 1.03],
        ];
        let allocation = AllocationVector::new(vec![0.5, 0.5]).unwrap();

        let correl_together =
            AllocationScorer::new(market(together, vec![0.0, 0.0]), params(1.0, true))
                    .breakdown(&allocation)
                .unwrap()
                .downside_correl
                .unwrap();
        let correl_offset =
            AllocationScorer::new(market(offset, vec![0.0, 0.0]), params(1.0, true))
                .breakdown(&allocation)
                .unwrap()
                .downside_correl
                .unwrap();

        assert!(correl_together > correl_offset);
        assert!(correl_together <= 1.0 + 1e-12);
    }

    #[test]
    fn test_length_mismatch_is_input_error() {
        let scorer = AllocationScorer::new(
            market(vec![vec![1.0, 1.0]], vec![0.0, 0.0]),
            params(1.0, false),
        );
        let result = scorer.score(&AllocationVector::seed(3));
        assert!(matches!(result, Err(AllocError::Input(_))));
    }
}
