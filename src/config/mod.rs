pub mod traits;
pub mod search;
pub mod universe;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use search::{DegenerateCorrelation, SearchConfig};
pub use universe::{InstrumentConfig, UniverseConfig};
pub use traits::ConfigSection;
