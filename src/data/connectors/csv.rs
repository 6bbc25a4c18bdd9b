use crate::config::UniverseConfig;
use crate::data::history::PriceHistory;
use crate::error::{AllocError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use super::{
    types::{HistoryMetadata, PriceColumn},
    validator::DataValidator,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct CsvConnector;

impl CsvConnector {
    /// Load CSV file into DataFrame
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
            .finish()
            .map_err(|e| {
                AllocError::DataLoading(format!(
                    "Failed to read CSV {}: {}",
                    path.as_ref().display(),
                    e
                ))
            })?;

        Ok(df)
    }

    /// Load one instrument's adjusted close series
    pub fn load_history<P: AsRef<Path>>(path: P, display_name: &str) -> Result<PriceHistory> {
        let df = Self::load(&path)?;
        let column_map = DataValidator::validate_price_columns(&df)?;
        DataValidator::validate_minimum_rows(&df, 2)?;

        let null_report = DataValidator::check_nulls(&df)?;
        if !null_report.is_empty() {
            return Err(AllocError::DataLoading(format!(
                "Null values in {}: {:?}",
                path.as_ref().display(),
                null_report
            )));
        }

        let dates = df.column(&column_map[&PriceColumn::Date])?.cast(&DataType::String)?;
        let prices = df
            .column(&column_map[&PriceColumn::AdjustedClose])?
            .cast(&DataType::Float64)?;

        let mut daily_prices = BTreeMap::new();
        for (raw_date, price) in dates.str()?.into_iter().zip(prices.f64()?.into_iter()) {
            let (raw_date, price) = match (raw_date, price) {
                (Some(d), Some(p)) => (d, p),
                _ => {
                    return Err(AllocError::DataLoading(format!(
                        "Missing value in {}",
                        path.as_ref().display()
                    )))
                }
            };
            let date = NaiveDate::parse_from_str(raw_date.trim(), DATE_FORMAT).map_err(|e| {
                AllocError::DataLoading(format!("Invalid date '{}': {}", raw_date, e))
            })?;
            if daily_prices.insert(date, price).is_some() {
                return Err(AllocError::DataLoading(format!(
                    "Duplicate date {} in {}",
                    date,
                    path.as_ref().display()
                )));
            }
        }

        Ok(PriceHistory::new(display_name, daily_prices))
    }

    /// Load `<data_dir>/<SYMBOL>.csv` for every configured instrument
    pub fn load_universe(universe: &UniverseConfig) -> Result<HashMap<String, PriceHistory>> {
        let mut histories = HashMap::with_capacity(universe.instruments.len());

        for instrument in &universe.instruments {
            let path = universe.data_dir.join(format!("{}.csv", instrument.symbol));
            let display_name = instrument.name.as_deref().unwrap_or(&instrument.symbol);
            let history = Self::load_history(&path, display_name)?;

            let metadata = Self::create_metadata(&instrument.symbol, &path, &history);
            log::debug!(
                "Loaded {} prices for {} from {} ({:?}, range {:.2} to {:.2})",
                metadata.num_prices,
                metadata.symbol,
                metadata.file_path,
                metadata.date_range,
                metadata.price_range.0,
                metadata.price_range.1
            );
            histories.insert(instrument.symbol.clone(), history);
        }

        Ok(histories)
    }

    /// Create metadata for a loaded history
    pub fn create_metadata<P: AsRef<Path>>(
        symbol: &str,
        path: P,
        history: &PriceHistory,
    ) -> HistoryMetadata {
        let date_range = history.first_date().zip(history.last_date());
        let price_range = history
            .daily_prices
            .values()
            .fold(None, |acc: Option<(f64, f64)>, &p| match acc {
                Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
                None => Some((p, p)),
            })
            .unwrap_or((0.0, 0.0));

        HistoryMetadata {
            symbol: symbol.to_string(),
            file_path: path.as_ref().to_string_lossy().to_string(),
            num_prices: history.len(),
            date_range,
            price_range,
        }
    }
}
