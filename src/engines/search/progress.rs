use super::controller::{HalvingReport, ProgressCallback};
use crate::types::SearchOutcome;
use std::sync::mpsc::Sender;

fn format_allocation(allocation: &[(String, f64)]) -> String {
    allocation
        .iter()
        .map(|(symbol, weight)| format!("{}={:.4}", symbol, weight))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reports progress through the `log` facade.
pub struct LogProgressCallback;

impl ProgressCallback for LogProgressCallback {
    fn on_search_start(&mut self, instruments: usize, workers: usize, initial_score: f64) {
        log::info!(
            "Searching {} instruments on {} workers, seed score {:.6}",
            instruments, workers, initial_score
        );
    }

    fn on_round_complete(
        &mut self,
        round: usize,
        step: f64,
        candidates: usize,
        best_score: f64,
        improved: bool,
    ) {
        log::debug!(
            "Round {} (step {}): {} candidates, best {:.6}{}",
            round,
            step,
            candidates,
            best_score,
            if improved { "" } else { ", no improvement" }
        );
    }

    fn on_step_halved(&mut self, report: &HalvingReport) {
        log::info!(
            "Step {} -> {} after {:.2?}, score {:.6}: {}",
            report.previous_step,
            report.new_step,
            report.elapsed,
            report.score,
            format_allocation(&report.allocation)
        );
    }

    fn on_search_complete(&mut self, outcome: &SearchOutcome) {
        log::info!(
            "Search finished after {} rounds and {} halvings, score {:.6}",
            outcome.rounds, outcome.halvings, outcome.score
        );
    }
}

/// Discards every event.
pub struct SilentProgressCallback;

impl ProgressCallback for SilentProgressCallback {
    fn on_round_complete(&mut self, _: usize, _: f64, _: usize, _: f64, _: bool) {}

    fn on_step_halved(&mut self, _report: &HalvingReport) {}
}

// For driving a search from another thread
pub struct ChannelProgressCallback {
    sender: Sender<ProgressMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage {
    Started { instruments: usize, workers: usize, initial_score: f64 },
    RoundComplete { round: usize, step: f64, best_score: f64, improved: bool },
    StepHalved(HalvingReport),
    Finished { score: f64, rounds: usize },
}

impl ChannelProgressCallback {
    pub fn new(sender: Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_search_start(&mut self, instruments: usize, workers: usize, initial_score: f64) {
        let _ = self.sender.send(ProgressMessage::Started {
            instruments,
            workers,
            initial_score,
        });
    }

    fn on_round_complete(
        &mut self,
        round: usize,
        step: f64,
        _candidates: usize,
        best_score: f64,
        improved: bool,
    ) {
        let _ = self.sender.send(ProgressMessage::RoundComplete {
            round,
            step,
            best_score,
            improved,
        });
    }

    fn on_step_halved(&mut self, report: &HalvingReport) {
        let _ = self.sender.send(ProgressMessage::StepHalved(report.clone()));
    }

    fn on_search_complete(&mut self, outcome: &SearchOutcome) {
        let _ = self.sender.send(ProgressMessage::Finished {
            score: outcome.score,
            rounds: outcome.rounds,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_format_allocation() {
        let allocation = vec![("VTI".to_string(), 0.75), ("BND".to_string(), 0.25)];
        assert_eq!(format_allocation(&allocation), "VTI=0.7500, BND=0.2500");
        assert_eq!(format_allocation(&[]), "");
    }

    #[test]
    fn test_channel_forwards_halvings() {
        let (tx, rx) = mpsc::channel();
        let mut callback = ChannelProgressCallback::new(tx);
        let report = HalvingReport {
            previous_step: 0.5,
            new_step: 0.25,
            elapsed: Duration::from_millis(3),
            score: 1.5,
            allocation: vec![("VTI".to_string(), 1.0)],
        };

        callback.on_round_complete(4, 0.5, 6, 1.5, false);
        callback.on_step_halved(&report);

        assert_eq!(
            rx.recv().unwrap(),
            ProgressMessage::RoundComplete { round: 4, step: 0.5, best_score: 1.5, improved: false }
        );
        assert_eq!(rx.recv().unwrap(), ProgressMessage::StepHalved(report));
    }

    #[test]
    fn test_channel_tolerates_closed_receiver() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let mut callback = ChannelProgressCallback::new(tx);
        callback.on_search_start(3, 2, 0.1);
    }
}
