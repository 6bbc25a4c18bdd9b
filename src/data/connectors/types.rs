use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Columns a price file must provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceColumn {
    Date,
    AdjustedClose,
}

impl PriceColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::AdjustedClose => "adjusted_close",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![Self::Date, Self::AdjustedClose]
    }

    /// Accepted header spellings, most specific first. Adjusted columns win
    /// over a plain close when a file carries both.
    pub fn aliases(&self) -> Vec<&'static str> {
        match self {
            Self::Date => vec!["date", "Date", "DATE", "timestamp", "Timestamp"],
            Self::AdjustedClose => vec![
                "adjusted_close",
                "adj_close",
                "Adj Close",
                "Adjusted Close",
                "5. adjusted close",
                "close",
                "Close",
                "CLOSE",
            ],
        }
    }
}

/// Summary of one loaded price file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMetadata {
    pub symbol: String,
    pub file_path: String,
    pub num_prices: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub price_range: (f64, f64),
}
