// src/engines/metrics/risk.rs
use crate::error::{AllocError, Result};

/// Variances at or below this are treated as a constant series.
const VARIANCE_EPSILON: f64 = 1e-20;

pub struct RiskMetrics;

impl RiskMetrics {
    /// Compounding mean of growth factors, `exp(mean(ln r))`. A constant
    /// series returns its value unchanged.
    pub fn geometric_mean(values: &[f64]) -> Result<f64> {
        if values.is_empty() {
            return Err(AllocError::Numeric(
                "Geometric mean of an empty series".to_string(),
            ));
        }

        let mut log_sum = 0.0;
        for (day, &value) in values.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(AllocError::Numeric(format!(
                    "Growth factor {} on day {} has no logarithm",
                    value, day
                )));
            }
            log_sum += value.ln();
        }

        if values.iter().all(|&v| v == values[0]) {
            return Ok(values[0]);
        }

        Ok((log_sum / values.len() as f64).exp())
    }

    /// Root mean square of the shortfalls below `required`, over every day
    /// (days at or above target contribute zero).
    pub fn downside_deviation(returns: &[f64], required: f64) -> f64 {
        if returns.is_empty() {
            return 0.0;
        }

        let sum_sq: f64 = returns
            .iter()
            .map(|&r| (r - required).min(0.0))
            .map(|s| s * s)
            .sum();

        (sum_sq / returns.len() as f64).sqrt()
    }

    /// Pearson correlation matrix of the columns of `rows`, row-major,
    /// `width x width`.
    ///
    /// A column with zero variance is uncorrelated with every other column
    /// and perfectly correlated with itself.
    pub fn correlation_matrix(rows: &[&[f64]], width: usize) -> Vec<f64> {
        let n = rows.len() as f64;
        let mut means = vec![0.0; width];
        for row in rows {
            for (m, &v) in means.iter_mut().zip(row.iter()) {
                *m += v;
            }
        }
        for m in means.iter_mut() {
            *m /= n;
        }

        let mut cov = vec![0.0; width * width];
        for row in rows {
            for i in 0..width {
                let di = row[i] - means[i];
                for j in i..width {
                    cov[i * width + j] += di * (row[j] - means[j]);
                }
            }
        }

        let mut corr = vec![0.0; width * width];
        for i in 0..width {
            corr[i * width + i] = 1.0;
            for j in (i + 1)..width {
                let var_i = cov[i * width + i] / n;
                let var_j = cov[j * width + j] / n;
                let value = if var_i <= VARIANCE_EPSILON || var_j <= VARIANCE_EPSILON {
                    0.0
                } else {
                    ((cov[i * width + j] / n) / (var_i * var_j).sqrt()).clamp(-1.0, 1.0)
                };
                corr[i * width + j] = value;
                corr[j * width + i] = value;
            }
        }

        corr
    }

    /// `w' M w` for a square row-major matrix.
    pub fn quadratic_form(weights: &[f64], matrix: &[f64]) -> f64 {
        let width = weights.len();
        weights
            .iter()
            .enumerate()
            .map(|(i, &wi)| {
                let row = &matrix[i * width..(i + 1) * width];
                wi * row.iter().zip(weights).map(|(m, w)| m * w).sum::<f64>()
            })
            .sum()
    }
}
