//! Refresh history for the header sparkline and throughput rate.

use std::collections::VecDeque;
use std::time::Instant;

use super::model::TransactionSummary;

/// Maximum number of samples to keep.
const MAX_HISTORY_SIZE: usize = 60;

#[derive(Debug, Clone, Copy)]
struct Sample {
    at: Instant,
    total_transactions: u64,
    alarming: u64,
}

/// Summary totals recorded at each refresh.
#[derive(Debug, Clone, Default)]
pub struct History {
    samples: VecDeque<Sample>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the summary received on a refresh.
    pub fn record(&mut self, summary: &TransactionSummary) {
        self.record_at(summary, Instant::now());
    }

    fn record_at(&mut self, summary: &TransactionSummary, at: Instant) {
        self.samples.push_back(Sample {
            at,
            total_transactions: summary.total_transactions(),
            alarming: summary.alarming_count,
        });
        if self.samples.len() > MAX_HISTORY_SIZE {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// New transactions per refresh, normalized to 0-7 for 8 bar levels.
    ///
    /// Returns an empty Vec if there's not enough history.
    pub fn transactions_sparkline(&self) -> Vec<u8> {
        normalize_sparkline(self.samples.iter().map(|s| s.total_transactions))
    }

    /// New alarming transactions per refresh, normalized like
    /// [`History::transactions_sparkline`].
    pub fn alarming_sparkline(&self) -> Vec<u8> {
        normalize_sparkline(self.samples.iter().map(|s| s.alarming))
    }

    /// Transactions per second between the last two refreshes.
    ///
    /// Returns None if there's not enough history to calculate a rate.
    pub fn transaction_rate(&self) -> Option<f64> {
        let len = self.samples.len();
        if len < 2 {
            return None;
        }
        let current = self.samples.get(len - 1)?;
        let previous = self.samples.get(len - 2)?;
        let delta = current.total_transactions as i64 - previous.total_transactions as i64;
        let elapsed = current.at.duration_since(previous.at).as_secs_f64();

        if elapsed > 0.0 {
            Some(delta as f64 / elapsed)
        } else {
            None
        }
    }
}

fn normalize_sparkline(values: impl Iterator<Item = u64>) -> Vec<u8> {
    let values: Vec<u64> = values.collect();
    if values.len() < 2 {
        return Vec::new();
    }

    // Counters may reset when the service restarts, so deltas can be negative
    let deltas: Vec<i64> = values.windows(2).map(|w| w[1] as i64 - w[0] as i64).collect();

    let max = deltas.iter().copied().max().unwrap_or(1).max(1);
    let min = deltas.iter().copied().min().unwrap_or(0).min(0);
    let range = (max - min).max(1) as f64;

    deltas
        .iter()
        .map(|&v| (((v - min) as f64 / range * 7.0) as u8).min(7))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn summary(committed: u64, alarming: u64) -> TransactionSummary {
        TransactionSummary {
            committed_count: committed,
            alarming_count: alarming,
            ..Default::default()
        }
    }

    #[test]
    fn test_history_new() {
        let history = History::new();
        assert!(history.is_empty());
        assert!(history.transactions_sparkline().is_empty());
        assert!(history.transaction_rate().is_none());
    }

    #[test]
    fn test_history_bounded() {
        let mut history = History::new();
        for i in 0..(MAX_HISTORY_SIZE as u64 + 10) {
            history.record(&summary(i, 0));
        }
        assert_eq!(history.len(), MAX_HISTORY_SIZE);
    }

    #[test]
    fn test_sparkline_levels() {
        let mut history = History::new();
        for total in [0, 10, 10, 80] {
            history.record(&summary(total, 0));
        }
        let sparkline = history.transactions_sparkline();
        assert_eq!(sparkline.len(), 3);
        assert_eq!(sparkline[1], 0);
        assert_eq!(sparkline[2], 7);
        assert!(sparkline[0] > 0 && sparkline[0] < 7);
    }

    #[test]
    fn test_transaction_rate() {
        let mut history = History::new();
        let start = Instant::now();
        history.record_at(&summary(100, 0), start);
        history.record_at(&summary(150, 0), start + Duration::from_secs(2));
        assert_eq!(history.transaction_rate(), Some(25.0));
    }

    #[test]
    fn test_rate_requires_elapsed_time() {
        let mut history = History::new();
        let at = Instant::now();
        history.record_at(&summary(1, 0), at);
        history.record_at(&summary(2, 0), at);
        assert!(history.transaction_rate().is_none());
    }
}
