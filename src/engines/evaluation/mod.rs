pub mod pool;
pub mod scorer;

pub use pool::{Candidate, Evaluation, WorkerPool};
pub use scorer::{AllocationScorer, ScoreBreakdown, ScoringParams};
