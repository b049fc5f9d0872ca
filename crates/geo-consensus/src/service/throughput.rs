//! Throughput tick

use crate::domain::ThroughputTracker;
use crate::state::ChainState;
use tokio::time::Instant;

/// Derive transactions per second from the counter and publish it.
pub(crate) fn refresh_throughput(
    state: &mut ChainState,
    tracker: &mut ThroughputTracker,
    now: Instant,
) -> f64 {
    let tps = tracker.sample(state.metrics.total_transactions, now);
    state.metrics.throughput_per_second = tps;
    tps
}
