pub mod controller;
pub mod neighborhood;
pub mod progress;

pub use controller::{HalvingReport, ProgressCallback, SearchController, SearchState, Transition};
pub use neighborhood::neighborhood;
pub use progress::{
    ChannelProgressCallback, LogProgressCallback, ProgressMessage, SilentProgressCallback,
};

use crate::config::{ConfigSection, SearchConfig};
use crate::data::MarketData;
use crate::engines::evaluation::{ScoringParams, WorkerPool};
use crate::error::Result;
use crate::types::SearchOutcome;
use std::sync::Arc;

/// Finds the allocation with the best modified Sortino ratio for `market`.
///
/// Builds a worker pool sized by `config.num_workers`, seeds the search with
/// the first instrument and climbs until the step falls below
/// `config.min_step`.
pub fn optimize<C: ProgressCallback>(
    market: MarketData,
    config: &SearchConfig,
    callback: C,
) -> Result<SearchOutcome> {
    config.validate()?;

    let pool = WorkerPool::new(Arc::new(market), ScoringParams::from(config), config.num_workers)?;
    SearchController::new(pool, config.min_step)?.run(callback)
}

/// [`optimize`] with progress reported through `log`.
pub fn find_optimal_allocation(market: MarketData, config: &SearchConfig) -> Result<SearchOutcome> {
    optimize(market, config, LogProgressCallback)
}
