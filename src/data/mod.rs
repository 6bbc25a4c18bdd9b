pub mod connectors;
pub mod history;
pub mod matrix;

pub use connectors::{CsvConnector, HistoryMetadata};
pub use history::{align_returns, PriceHistory};
pub use matrix::{MarketData, ReturnMatrix};
