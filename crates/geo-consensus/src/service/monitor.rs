//! Network monitor tick
//!
//! Probes every ordered pair of distinct nodes, stores the samples on the
//! source node and rebuilds the per-region-pair latency means from scratch.

use crate::domain::{region_pair_label, GeoConfig, NodeId};
use crate::ports::LatencyProbe;
use crate::state::ChainState;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

/// What one network refresh observed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NetworkRefresh {
    pub samples: u64,
    pub cross_region: u64,
    /// Region pairs whose mean exceeded the latency threshold
    pub slow_pairs: Vec<(String, Duration)>,
}

#[derive(Default)]
struct PairAccumulator {
    total: Duration,
    count: u64,
}

/// Mean of `count` samples summing to `total`, without narrowing the count.
fn mean(total: Duration, count: u64) -> Duration {
    if count == 0 {
        return Duration::ZERO;
    }
    let nanos = total.as_nanos() / u128::from(count);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Run one refresh against `state`. The caller holds the write lock for
/// the whole call.
///
/// Every registered node is stamped as seen at `now`. With fewer than two
/// nodes nothing is sampled and the previous aggregate is left as is.
pub(crate) fn refresh_network(
    state: &mut ChainState,
    probe: &dyn LatencyProbe,
    config: &GeoConfig,
    now: DateTime<Utc>,
) -> NetworkRefresh {
    let ids = state.topology.node_ids();
    let mut pairs: BTreeMap<String, PairAccumulator> = BTreeMap::new();
    let mut refresh = NetworkRefresh::default();
    let mut total = Duration::ZERO;

    for &from in &ids {
        let Some(source) = state.topology.node(from).map(|n| n.location.clone()) else {
            continue;
        };

        let mut measured: Vec<(NodeId, Duration)> = Vec::with_capacity(ids.len());
        for &to in ids.iter().filter(|id| **id != from) {
            // a peer that vanished mid-tick is skipped, not fatal
            let Some(target) = state.topology.node(to) else {
                continue;
            };
            let sample = probe.measure(&source, &target.location);

            if !source.same_region(&target.location) {
                refresh.cross_region += 1;
            }
            let slot = pairs
                .entry(region_pair_label(&source.region, &target.location.region))
                .or_default();
            slot.total += sample;
            slot.count += 1;

            total += sample;
            refresh.samples += 1;
            measured.push((to, sample));
        }

        if let Some(node) = state.topology.node_mut(from) {
            node.latency.extend(measured);
            node.last_seen = now;
        }
    }

    if refresh.samples == 0 {
        return refresh;
    }

    let region_latencies: BTreeMap<String, Duration> = pairs
        .into_iter()
        .map(|(label, acc)| (label, mean(acc.total, acc.count)))
        .collect();

    refresh.slow_pairs = region_latencies
        .iter()
        .filter(|(_, mean)| **mean > config.latency_threshold)
        .map(|(label, mean)| (label.clone(), *mean))
        .collect();

    let metrics = &mut state.metrics;
    metrics.avg_latency = mean(total, refresh.samples);
    metrics.region_latencies = region_latencies;
    metrics.cross_region_messages += refresh.cross_region;

    refresh
}
