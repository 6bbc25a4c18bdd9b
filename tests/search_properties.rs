use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sortino_alloc::config::{DegenerateCorrelation, SearchConfig};
use sortino_alloc::data::{MarketData, ReturnMatrix};
use sortino_alloc::engines::search::{
    optimize, ChannelProgressCallback, ProgressMessage, SilentProgressCallback,
};
use sortino_alloc::{ExpenseVector, InstrumentList, SearchOutcome};
use std::sync::mpsc;

/// Five funds with different drifts and volatilities over a synthetic year.
fn synthetic_market(seed: u64) -> MarketData {
    let mut rng = StdRng::seed_from_u64(seed);
    let profiles = [
        (0.0006, 0.012),
        (0.0003, 0.004),
        (0.0001, 0.001),
        (0.0008, 0.02),
        (0.0004, 0.008),
    ];

    let rows: Vec<Vec<f64>> = (0..253)
        .map(|_| {
            profiles
                .iter()
                .map(|&(drift, vol)| 1.0 + drift + rng.gen_range(-vol..vol))
                .collect()
        })
        .collect();

    MarketData::new(
        InstrumentList::new(
            ["VTI", "BND", "SHV", "QQQ", "VXUS"].iter().map(|s| s.to_string()).collect(),
        )
        .unwrap(),
        ReturnMatrix::new(rows).unwrap(),
        ExpenseVector::new(vec![0.0003, 0.0003, 0.0015, 0.0020, 0.0007]).unwrap(),
    )
    .unwrap()
}

fn config(num_workers: usize) -> SearchConfig {
    SearchConfig {
        required_return: 1.0002,
        num_workers,
        degenerate_correlation: DegenerateCorrelation::Neutral,
        ..SearchConfig::default()
    }
}

fn run(seed: u64, num_workers: usize) -> SearchOutcome {
    optimize(synthetic_market(seed), &config(num_workers), SilentProgressCallback).unwrap()
}

#[test]
fn test_reruns_are_bit_identical() {
    let first = run(7, 3);
    let second = run(7, 3);

    assert_eq!(first.score.to_bits(), second.score.to_bits());
    assert_eq!(first.allocation, second.allocation);
    assert_eq!(first.rounds, second.rounds);
}

#[test]
fn test_worker_count_does_not_change_result() {
    for seed in [1, 2, 3] {
        let single = run(seed, 1);
        let many = run(seed, 4);
        assert_eq!(single.score.to_bits(), many.score.to_bits());
        assert_eq!(single.allocation, many.allocation);
    }
}

#[test]
fn test_final_allocation_is_on_the_grid() {
    let outcome = run(11, 2);
    let grid = 1.0 / SearchConfig::default().min_step;

    assert!(outcome.allocation.is_fully_invested());
    for &w in outcome.allocation.as_slice() {
        assert!(w >= 0.0);
        assert_eq!((w * grid).fract(), 0.0);
    }
}

#[test]
fn test_halving_count_matches_resolution() {
    let outcome = run(5, 2);
    assert_eq!(outcome.halvings, SearchConfig::default().max_halvings());

    let coarse = SearchConfig {
        min_step: 0.01,
        ..config(2)
    };
    let outcome = optimize(synthetic_market(5), &coarse, SilentProgressCallback).unwrap();
    assert_eq!(outcome.halvings, 7);
}

#[test]
fn test_progress_scores_never_decrease() {
    let (tx, rx) = mpsc::channel();
    let outcome =
        optimize(synthetic_market(13), &config(2), ChannelProgressCallback::new(tx)).unwrap();
    let messages: Vec<ProgressMessage> = rx.try_iter().collect();

    let initial = match messages.first() {
        Some(ProgressMessage::Started { initial_score, .. }) => *initial_score,
        other => panic!("expected a start message, got {:?}", other),
    };

    let mut best = initial;
    let mut halvings = 0;
    for message in &messages {
        match message {
            ProgressMessage::RoundComplete { best_score, improved, .. } => {
                if *improved {
                    assert!(*best_score > best);
                    best = *best_score;
                } else {
                    assert_eq!(*best_score, best);
                }
            }
            ProgressMessage::StepHalved(report) => {
                assert_eq!(report.score, best);
                assert_eq!(report.new_step, report.previous_step / 2.0);
                let total: f64 = report.allocation.iter().map(|(_, w)| w).sum();
                assert!((total - 1.0).abs() < 1e-9);
                halvings += 1;
            }
            _ => {}
        }
    }

    assert_eq!(halvings, outcome.halvings);
    assert_eq!(best, outcome.score);
    assert!(outcome.score >= initial);
    assert!(matches!(messages.last(), Some(ProgressMessage::Finished { .. })));
}
