mod csv;
mod types;
mod validator;

pub use csv::CsvConnector;
pub use types::{HistoryMetadata, PriceColumn};
pub use validator::DataValidator;
