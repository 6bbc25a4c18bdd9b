use crate::{
    data::MarketData,
    engines::evaluation::scorer::{AllocationScorer, ScoringParams},
    error::{AllocError, Result},
    types::{AllocationVector, ScoreResult},
};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// One single-trade neighbor: `step` of capital moved from `sell` to `buy`.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub sell: usize,
    pub buy: usize,
    pub allocation: AllocationVector,
}

/// A scored candidate, still tagged with the trade that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub sell: usize,
    pub buy: usize,
    pub result: ScoreResult,
}

/// Fixed-size pool that scores candidate batches against one shared,
/// read-only copy of the market data.
pub struct WorkerPool {
    pool: ThreadPool,
    scorer: AllocationScorer,
}

impl WorkerPool {
    /// `num_workers == 0` sizes the pool to the number of cores.
    pub fn new(market: Arc<MarketData>, params: ScoringParams, num_workers: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .thread_name(|i| format!("alloc-scorer-{}", i))
            .build()
            .map_err(|e| AllocError::Worker(format!("Failed to build scoring pool: {}", e)))?;

        Ok(Self {
            pool,
            scorer: AllocationScorer::new(market, params),
        })
    }

    pub fn num_workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn market(&self) -> &MarketData {
        self.scorer.market()
    }

    /// Scores a single allocation on the calling thread.
    pub fn score(&self, allocation: &AllocationVector) -> Result<ScoreResult> {
        self.scorer.score(allocation)
    }

    /// Scores every candidate and waits for all of them. Any failure fails
    /// the whole batch; a panicking task becomes a `Worker` error.
    pub fn evaluate(&self, candidates: &[Candidate]) -> Result<Vec<Evaluation>> {
        let scorer = &self.scorer;
        self.evaluate_with(candidates, |allocation| scorer.score(allocation))
    }

    /// Runs `score` over the batch on the pool. When several candidates fail,
    /// the error of the earliest one in batch order is returned.
    pub(crate) fn evaluate_with<F>(
        &self,
        candidates: &[Candidate],
        score: F,
    ) -> Result<Vec<Evaluation>>
    where
        F: Fn(&AllocationVector) -> Result<ScoreResult> + Sync,
    {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.pool.install(|| {
                candidates
                    .par_iter()
                    .map(|candidate| {
                        score(&candidate.allocation).map(|result| Evaluation {
                            sell: candidate.sell,
                            buy: candidate.buy,
                            result,
                        })
                    })
                    .collect::<Vec<Result<Evaluation>>>()
            })
        }));

        match outcome {
            Ok(results) => results.into_iter().collect(),
            Err(payload) => Err(AllocError::Worker(format!(
                "Scoring task panicked: {}",
                panic_message(payload.as_ref())
            ))),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
