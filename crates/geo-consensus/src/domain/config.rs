//! Chain and scheduling configuration

use super::GeoError;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::time::Duration;

/// Per-chain geo configuration. Read-only once the chain exists.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    /// Region pairs whose mean latency exceeds this are reported
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "latency_threshold_ms")]
    pub latency_threshold: Duration,
    /// Proximity multiplier for peers sharing a region
    pub region_weight: f64,
    /// Weight of the mean proximity term in the leader score
    pub proximity_weight: f64,
    /// Penalise stale nodes during leader selection
    pub load_balance_enabled: bool,
    pub cross_region_ratio: f64,
    pub adaptive_timeout: bool,
    pub hierarchical_mode: bool,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            latency_threshold: Duration::from_millis(100),
            region_weight: 2.0,
            proximity_weight: 1.0,
            load_balance_enabled: true,
            cross_region_ratio: 0.3,
            adaptive_timeout: true,
            hierarchical_mode: false,
        }
    }
}

/// Cadence of the background tasks.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskSchedule {
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "network_refresh_ms")]
    pub network_refresh: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "throughput_refresh_ms")]
    pub throughput_refresh: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "aggregation_ms")]
    pub aggregation: Duration,
    /// Upper bound on waiting for in-flight ticks at shutdown
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "shutdown_grace_ms")]
    pub shutdown_grace: Duration,
}

impl Default for TaskSchedule {
    fn default() -> Self {
        Self {
            network_refresh: Duration::from_secs(30),
            throughput_refresh: Duration::from_secs(10),
            aggregation: Duration::from_secs(30),
            shutdown_grace: Duration::from_secs(30),
        }
    }
}

impl TaskSchedule {
    /// Every periodic task needs a non-zero cadence. A zero grace period is
    /// allowed and aborts in-flight ticks at shutdown.
    pub fn validate(&self) -> Result<(), GeoError> {
        for (task, period) in [
            ("network_monitor", self.network_refresh),
            ("chain_metrics", self.throughput_refresh),
            ("registry_aggregation", self.aggregation),
        ] {
            if period.is_zero() {
                return Err(GeoError::InvalidSchedule { task });
            }
        }
        Ok(())
    }
}
