use crate::engines::evaluation::{Evaluation, WorkerPool};
use crate::engines::search::neighborhood::neighborhood;
use crate::error::{AllocError, Result};
use crate::types::{AllocationVector, SearchOutcome};
use std::time::{Duration, Instant};

/// Starting trade size: the whole portfolio.
pub const INITIAL_STEP: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    Searching {
        allocation: AllocationVector,
        score: f64,
        step: f64,
    },
    Terminated {
        allocation: AllocationVector,
        score: f64,
    },
}

/// What a single round did.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Adopted a strictly better neighbor, step unchanged.
    Advanced { sell: usize, buy: usize, score: f64 },
    /// No neighbor improved; the step was halved and the search continues.
    Halved { step: f64 },
    /// The step dropped below the resolution floor.
    Terminated,
}

/// Emitted every time the step is halved.
#[derive(Debug, Clone, PartialEq)]
pub struct HalvingReport {
    pub previous_step: f64,
    pub new_step: f64,
    /// Wall time spent at `previous_step`.
    pub elapsed: Duration,
    pub score: f64,
    /// Nonzero weights only, in canonical order.
    pub allocation: Vec<(String, f64)>,
}

pub trait ProgressCallback: Send {
    fn on_search_start(&mut self, _instruments: usize, _workers: usize, _initial_score: f64) {}
    fn on_round_complete(
        &mut self,
        round: usize,
        step: f64,
        candidates: usize,
        best_score: f64,
        improved: bool,
    );
    fn on_step_halved(&mut self, report: &HalvingReport);
    fn on_search_complete(&mut self, _outcome: &SearchOutcome) {}
}

/// Greedy single-trade hill climb with a halving step size.
pub struct SearchController {
    pool: WorkerPool,
    min_step: f64,
    state: SearchState,
    rounds: usize,
    halvings: usize,
    level_started: Instant,
}

impl SearchController {
    /// Seeds the search with everything in the first instrument and scores
    /// that seed once.
    pub fn new(pool: WorkerPool, min_step: f64) -> Result<Self> {
        if !min_step.is_finite() || min_step <= 0.0 || min_step > INITIAL_STEP {
            return Err(AllocError::Configuration(format!(
                "Minimum step must be in (0, {}], got {}",
                INITIAL_STEP, min_step
            )));
        }

        let allocation = AllocationVector::seed(pool.market().num_instruments());
        let score = pool.score(&allocation)?.score;

        Ok(Self {
            pool,
            min_step,
            state: SearchState::Searching {
                allocation,
                score,
                step: INITIAL_STEP,
            },
            rounds: 0,
            halvings: 0,
            level_started: Instant::now(),
        })
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, SearchState::Terminated { .. })
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn halvings(&self) -> usize {
        self.halvings
    }

    /// Runs one generate / evaluate / select round. Every candidate of the
    /// round is scored before the next state is chosen.
    pub fn step<C: ProgressCallback>(&mut self, callback: &mut C) -> Result<Transition> {
        let (allocation, score, step) = match &self.state {
            SearchState::Terminated { .. } => return Ok(Transition::Terminated),
            SearchState::Searching { allocation, score, step } => {
                (allocation.clone(), *score, *step)
            }
        };

        let candidates = neighborhood(&allocation, step);
        let evaluations = self.pool.evaluate(&candidates)?;
        self.rounds += 1;

        let best = select_best(evaluations).filter(|best| best.result.score > score);
        let best_score = best.as_ref().map_or(score, |b| b.result.score);
        callback.on_round_complete(self.rounds, step, candidates.len(), best_score, best.is_some());

        if let Some(best) = best {
            debug_assert!(best.result.allocation.is_fully_invested());
            let transition = Transition::Advanced {
                sell: best.sell,
                buy: best.buy,
                score: best.result.score,
            };
            self.state = SearchState::Searching {
                allocation: best.result.allocation,
                score: best.result.score,
                step,
            };
            return Ok(transition);
        }

        let new_step = step / 2.0;
        self.halvings += 1;
        let report = HalvingReport {
            previous_step: step,
            new_step,
            elapsed: self.level_started.elapsed(),
            score,
            allocation: allocation.sparse(self.pool.market().instruments()),
        };
        callback.on_step_halved(&report);
        self.level_started = Instant::now();

        if new_step < self.min_step {
            self.state = SearchState::Terminated { allocation, score };
            Ok(Transition::Terminated)
        } else {
            self.state = SearchState::Searching {
                allocation,
                score,
                step: new_step,
            };
            Ok(Transition::Halved { step: new_step })
        }
    }

    /// Drives rounds until the step falls below the floor.
    pub fn run<C: ProgressCallback>(mut self, mut callback: C) -> Result<SearchOutcome> {
        if let SearchState::Searching { score, .. } = &self.state {
            callback.on_search_start(
                self.pool.market().num_instruments(),
                self.pool.num_workers(),
                *score,
            );
        }

        loop {
            if let SearchState::Terminated { allocation, score } = &self.state {
                let outcome = SearchOutcome {
                    score: *score,
                    allocation: allocation.clone(),
                    instruments: self.pool.market().instruments().clone(),
                    rounds: self.rounds,
                    halvings: self.halvings,
                };
                callback.on_search_complete(&outcome);
                return Ok(outcome);
            }
            self.step(&mut callback)?;
        }
    }
}

/// Highest score wins; equal scores go to the lowest `(sell, buy)` trade, so
/// the pick never depends on the order results arrived in.
pub fn select_best(evaluations: Vec<Evaluation>) -> Option<Evaluation> {
    evaluations.into_iter().fold(None, |best, candidate| match best {
        None => Some(candidate),
        Some(current) => {
            let better = candidate.result.score > current.result.score
                || (candidate.result.score == current.result.score
                    && (candidate.sell, candidate.buy) < (current.sell, current.buy));
            Some(if better { candidate } else { current })
        }
    })
}
