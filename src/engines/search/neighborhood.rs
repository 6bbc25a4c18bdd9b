use crate::engines::evaluation::Candidate;
use crate::types::AllocationVector;

/// Every single-trade neighbor of `current` at `step`, in ascending
/// `(sell, buy)` order. Instruments holding less than `step` are not sold.
pub fn neighborhood(current: &AllocationVector, step: f64) -> Vec<Candidate> {
    let n = current.len();
    let mut candidates = Vec::with_capacity(n * n.saturating_sub(1));

    for sell in 0..n {
        if current.weight(sell) < step {
            continue;
        }
        for buy in (0..n).filter(|&buy| buy != sell) {
            candidates.push(Candidate {
                sell,
                buy,
                allocation: current.transfer(sell, buy, step),
            });
        }
    }

    candidates
}
