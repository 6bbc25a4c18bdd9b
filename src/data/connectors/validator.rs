use crate::error::{AllocError, Result};
use polars::prelude::*;
use super::types::PriceColumn;
use std::collections::HashMap;

pub struct DataValidator;

impl DataValidator {
    /// Validate that DataFrame has a date column and a numeric adjusted close
    pub fn validate_price_columns(df: &DataFrame) -> Result<HashMap<PriceColumn, String>> {
        let mut column_map = HashMap::new();

        for required in PriceColumn::all() {
            match Self::find_column(df, &required) {
                Some(col_name) => {
                    column_map.insert(required, col_name.to_string());
                }
                None => {
                    return Err(AllocError::DataLoading(format!(
                        "Missing required column: {} (tried aliases: {:?})",
                        required.as_str(),
                        required.aliases()
                    )));
                }
            }
        }

        let price_name = &column_map[&PriceColumn::AdjustedClose];
        let series = df.column(price_name)?;
        if !matches!(
            series.dtype(),
            DataType::Float64
                | DataType::Float32
                | DataType::Int64
                | DataType::Int32
                | DataType::UInt64
                | DataType::UInt32
        ) {
            return Err(AllocError::DataLoading(format!(
                "Column '{}' ({}) must be numeric, found {:?}",
                price_name,
                PriceColumn::AdjustedClose.as_str(),
                series.dtype()
            )));
        }

        Ok(column_map)
    }

    /// Find column by checking aliases
    fn find_column<'a>(df: &'a DataFrame, required: &PriceColumn) -> Option<&'a str> {
        let columns = df.get_column_names();
        for alias in required.aliases() {
            if columns.iter().any(|col| col.as_str() == alias) {
                return Some(alias);
            }
        }
        None
    }

    /// Check for minimum required rows
    pub fn validate_minimum_rows(df: &DataFrame, min_rows: usize) -> Result<()> {
        if df.height() < min_rows {
            return Err(AllocError::DataLoading(format!(
                "Insufficient data: {} rows, minimum {} required",
                df.height(),
                min_rows
            )));
        }
        Ok(())
    }

    /// Null counts per column, only for columns that have any
    pub fn check_nulls(df: &DataFrame) -> Result<Vec<(String, usize)>> {
        let mut null_report = Vec::new();

        for col_name in df.get_column_names() {
            let series = df.column(col_name)?;
            let null_count = series.null_count();
            if null_count > 0 {
                null_report.push((col_name.to_string(), null_count));
            }
        }

        Ok(null_report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn test_validate_good_data() {
        let df = df! {
            "date" => &["2024-01-02", "2024-01-03"],
            "adjusted_close" => &[100.0, 101.0],
        }
        .unwrap();

        let column_map = DataValidator::validate_price_columns(&df).unwrap();
        assert_eq!(column_map[&PriceColumn::Date], "date");
        assert_eq!(column_map[&PriceColumn::AdjustedClose], "adjusted_close");
    }

    #[test]
    fn test_adjusted_close_preferred_over_close() {
        let df = df! {
            "Date" => &["2024-01-02", "2024-01-03"],
            "Close" => &[100.0, 101.0],
            "Adj Close" => &[98.0, 99.0],
        }
        .unwrap();

        let column_map = DataValidator::validate_price_columns(&df).unwrap();
        assert_eq!(column_map[&PriceColumn::AdjustedClose], "Adj Close");
    }

    #[test]
    fn test_validate_missing_column() {
        let df = df! {
            "date" => &["2024-01-02", "2024-01-03"],
            "volume" => &[1000.0, 1500.0],
        }
        .unwrap();

        let result = DataValidator::validate_price_columns(&df);
        assert!(matches!(result, Err(AllocError::DataLoading(_))));
    }

    #[test]
    fn test_non_numeric_price_rejected() {
        let df = df! {
            "date" => &["2024-01-02", "2024-01-03"],
            "close" => &["n/a", "101.0"],
        }
        .unwrap();

        assert!(DataValidator::validate_price_columns(&df).is_err());
    }

    #[test]
    fn test_minimum_rows() {
        let df = df! {
            "date" => &["2024-01-02"],
            "close" => &[100.0],
        }
        .unwrap();

        assert!(DataValidator::validate_minimum_rows(&df, 2).is_err());
        assert!(DataValidator::validate_minimum_rows(&df, 1).is_ok());
    }
}
