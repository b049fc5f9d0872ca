//! # Geo Consensus Metrics
//!
//! Prometheus metrics for the geo layer.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! geo-consensus = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `geo_nodes_registered_total` - Counter of node registrations (new or upsert)
//! - `geo_leader_elections_total` - Counter of scored leader elections, by chain
//! - `geo_network_refresh_total` - Counter of network refresh ticks, by chain
//! - `geo_throughput_tps` - Gauge of the derived throughput, by chain

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_gauge_vec, register_int_counter, register_int_counter_vec, GaugeVec, IntCounter,
    IntCounterVec,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total node registrations
    pub static ref NODES_REGISTERED: IntCounter = register_int_counter!(
        "geo_nodes_registered_total",
        "Total number of node registrations"
    )
    .expect("Failed to create NODES_REGISTERED metric");

    /// Scored leader elections, labeled by chain
    pub static ref LEADER_ELECTIONS: IntCounterVec = register_int_counter_vec!(
        "geo_leader_elections_total",
        "Total number of geo-aware leader elections",
        &["chain"]
    )
    .expect("Failed to create LEADER_ELECTIONS metric");

    /// Network refresh ticks, labeled by chain
    pub static ref NETWORK_REFRESHES: IntCounterVec = register_int_counter_vec!(
        "geo_network_refresh_total",
        "Total number of network latency refresh ticks",
        &["chain"]
    )
    .expect("Failed to create NETWORK_REFRESHES metric");

    /// Derived throughput, labeled by chain
    pub static ref THROUGHPUT: GaugeVec = register_gauge_vec!(
        "geo_throughput_tps",
        "Transactions per second over the last throughput interval",
        &["chain"]
    )
    .expect("Failed to create THROUGHPUT metric");
}

#[cfg(feature = "metrics")]
pub fn record_node_registered() {
    NODES_REGISTERED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_leader_elected(chain_id: &str) {
    LEADER_ELECTIONS.with_label_values(&[chain_id]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_network_refresh(chain_id: &str) {
    NETWORK_REFRESHES.with_label_values(&[chain_id]).inc();
}

#[cfg(feature = "metrics")]
pub fn set_throughput(chain_id: &str, tps: f64) {
    THROUGHPUT.with_label_values(&[chain_id]).set(tps);
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_node_registered() {}

#[cfg(not(feature = "metrics"))]
pub fn record_leader_elected(_chain_id: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_network_refresh(_chain_id: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn set_throughput(_chain_id: &str, _tps: f64) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording_does_not_panic() {
        record_node_registered();
        record_leader_elected("test");
        record_network_refresh("test");
        set_throughput("test", 1.5);
    }
}
