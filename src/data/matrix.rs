use crate::error::{AllocError, Result};
use crate::types::{ExpenseVector, InstrumentList};
use chrono::NaiveDate;

/// Day x instrument growth factors, stored row-major.
///
/// A cell of `1.002` means the instrument closed 0.2% higher than the
/// previous trading day. Rows are chronological, columns follow the
/// instrument list.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    num_days: usize,
    num_instruments: usize,
    values: Vec<f64>,
    dates: Option<Vec<NaiveDate>>,
}

impl ReturnMatrix {
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        let num_days = rows.len();
        if num_days == 0 {
            return Err(AllocError::Input(
                "Return matrix must contain at least one day".to_string(),
            ));
        }

        let num_instruments = rows[0].len();
        if num_instruments == 0 {
            return Err(AllocError::Input(
                "Return matrix must contain at least one instrument".to_string(),
            ));
        }

        let mut values = Vec::with_capacity(num_days * num_instruments);
        for (day, row) in rows.into_iter().enumerate() {
            if row.len() != num_instruments {
                return Err(AllocError::Input(format!(
                    "Return matrix is not rectangular: day {} has {} columns, expected {}",
                    day,
                    row.len(),
                    num_instruments
                )));
            }
            if let Some((col, value)) = row
                .iter()
                .enumerate()
                .find(|(_, v)| !v.is_finite() || **v <= 0.0)
            {
                return Err(AllocError::Input(format!(
                    "Invalid growth factor {} at day {}, instrument {}",
                    value, day, col
                )));
            }
            values.extend(row);
        }

        Ok(Self {
            num_days,
            num_instruments,
            values,
            dates: None,
        })
    }

    /// Attaches a date axis. Dates must be strictly increasing, one per row.
    pub fn with_dates(mut self, dates: Vec<NaiveDate>) -> Result<Self> {
        if dates.len() != self.num_days {
            return Err(AllocError::Input(format!(
                "Date axis has {} entries but the return matrix has {} days",
                dates.len(),
                self.num_days
            )));
        }
        if let Some(pair) = dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(AllocError::Input(format!(
                "Dates must be strictly increasing: {} is followed by {}",
                pair[0], pair[1]
            )));
        }
        self.dates = Some(dates);
        Ok(self)
    }

    pub fn num_days(&self) -> usize {
        self.num_days
    }

    pub fn num_instruments(&self) -> usize {
        self.num_instruments
    }

    pub fn dates(&self) -> Option<&[NaiveDate]> {
        self.dates.as_deref()
    }

    pub fn row(&self, day: usize) -> &[f64] {
        let start = day * self.num_instruments;
        &self.values[start..start + self.num_instruments]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(self.num_instruments)
    }

    /// Per-day portfolio growth: each row dotted with `weights`.
    pub fn portfolio_returns(&self, weights: &[f64]) -> Vec<f64> {
        self.rows()
            .map(|row| row.iter().zip(weights).map(|(r, w)| r * w).sum::<f64>())
            .collect()
    }
}

/// Everything a scoring task reads: the matrix plus the two vectors bound to
/// its columns. Built once per search and shared read-only.
#[derive(Debug, Clone)]
pub struct MarketData {
    instruments: InstrumentList,
    returns: ReturnMatrix,
    expenses: ExpenseVector,
}

impl MarketData {
    pub fn new(
        instruments: InstrumentList,
        returns: ReturnMatrix,
        expenses: ExpenseVector,
    ) -> Result<Self> {
        if returns.num_instruments() != instruments.len() {
            return Err(AllocError::Input(format!(
                "Return matrix has {} columns but {} instruments were given",
                returns.num_instruments(),
                instruments.len()
            )));
        }
        if expenses.len() != instruments.len() {
            return Err(AllocError::Input(format!(
                "Expense vector has {} entries but {} instruments were given",
                expenses.len(),
                instruments.len()
            )));
        }

        Ok(Self {
            instruments,
            returns,
            expenses,
        })
    }

    pub fn instruments(&self) -> &InstrumentList {
        &self.instruments
    }

    pub fn returns(&self) -> &ReturnMatrix {
        &self.returns
    }

    pub fn expenses(&self) -> &ExpenseVector {
        &self.expenses
    }

    pub fn num_instruments(&self) -> usize {
        self.instruments.len()
    }
}
