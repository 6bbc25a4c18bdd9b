pub mod config;
pub mod data;
pub mod engines;
pub mod error;
pub mod types;

pub use engines::search::{find_optimal_allocation, optimize};
pub use error::{AllocError, ErrorKind, Result};
pub use types::{AllocationVector, ExpenseVector, InstrumentList, ScoreResult, SearchOutcome};
