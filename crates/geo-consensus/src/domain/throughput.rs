//! Transaction throughput derived from a sampled counter

use std::time::Duration;
use tokio::time::Instant;

/// Checkpoint of the transaction counter between throughput ticks.
///
/// The first sample only establishes the baseline and yields zero.
#[derive(Clone, Debug, Default)]
pub struct ThroughputTracker {
    checkpoint: Option<(u64, Instant)>,
}

impl ThroughputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transactions per second since the previous sample, never negative.
    ///
    /// A counter that went backwards (reset) counts as zero new transactions.
    pub fn sample(&mut self, total_transactions: u64, now: Instant) -> f64 {
        let rate = match self.checkpoint {
            None => 0.0,
            Some((last_count, last_at)) => {
                let delta = total_transactions.saturating_sub(last_count);
                let elapsed = now.saturating_duration_since(last_at);
                per_second(delta, elapsed)
            }
        };
        self.checkpoint = Some((total_transactions, now));
        rate
    }
}

fn per_second(delta: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        delta as f64 / secs
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_is_baseline() {
        let mut tracker = ThroughputTracker::new();
        assert_eq!(tracker.sample(10_000, Instant::now()), 0.0);
    }

    #[test]
    fn test_rate_over_interval() {
        let mut tracker = ThroughputTracker::new();
        let start = Instant::now();
        tracker.sample(100, start);
        let rate = tracker.sample(600, start + Duration::from_secs(10));
        assert!((rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_counter_reset_is_not_negative() {
        let mut tracker = ThroughputTracker::new();
        let start = Instant::now();
        tracker.sample(500, start);
        assert_eq!(tracker.sample(20, start + Duration::from_secs(10)), 0.0);
        // the reset value becomes the new checkpoint
        let rate = tracker.sample(40, start + Duration::from_secs(20));
        assert!((rate - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_unchanged_counter_and_zero_elapsed() {
        let mut tracker = ThroughputTracker::new();
        let start = Instant::now();
        tracker.sample(7, start);
        assert_eq!(tracker.sample(7, start + Duration::from_secs(10)), 0.0);
        assert_eq!(tracker.sample(9, start + Duration::from_secs(10)), 0.0);
    }
}
