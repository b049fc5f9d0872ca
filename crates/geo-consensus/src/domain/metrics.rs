//! Chain and registry metric records

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::collections::BTreeMap;
use std::time::Duration;

/// Performance counters of one chain.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoMetrics {
    pub total_transactions: u64,
    /// Mean of all samples of the last network refresh
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "avg_latency_ms")]
    pub avg_latency: Duration,
    /// Mean latency per `"{from_region}-{to_region}"` label
    #[serde_as(as = "BTreeMap<_, DurationMilliSeconds<u64>>")]
    #[serde(rename = "region_latencies_ms")]
    pub region_latencies: BTreeMap<String, Duration>,
    pub leader_elections: u64,
    pub cross_region_messages: u64,
    pub throughput_per_second: f64,
}

/// Process-wide counters kept by the registry.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryMetrics {
    pub active_chains: usize,
    pub total_requests: u64,
    pub failed_requests: u64,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "avg_response_time_ms")]
    pub avg_response_time: Duration,
    /// Per-chain metrics as of the last aggregation pass
    pub chain_metrics: BTreeMap<String, GeoMetrics>,
}

/// Label used for region pair latency aggregates.
pub fn region_pair_label(from: &str, to: &str) -> String {
    format!("{from}-{to}")
}
