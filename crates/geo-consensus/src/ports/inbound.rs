//! Driving ports (Inbound API)

use crate::domain::{ChainReport, HealthReport, QueryError, RegistryMetrics, TopologySnapshot};
use std::collections::BTreeMap;
use std::time::Duration;

/// Read-only monitoring queries served by the chain registry.
///
/// Every method is strictly observational except [`MonitoringApi::record_request`],
/// which only feeds the request counters reported back by
/// [`MonitoringApi::aggregate_metrics`].
pub trait MonitoringApi: Send + Sync {
    /// Registry counters plus per-chain metrics as of the last aggregation
    fn aggregate_metrics(&self) -> Result<RegistryMetrics, QueryError>;

    /// Topology of every managed chain
    fn topology(&self) -> Result<BTreeMap<String, TopologySnapshot>, QueryError>;

    /// Liveness indicator; answers even while shutting down
    fn health(&self) -> HealthReport;

    /// One chain's report, or all of them when `chain_id` is `None`
    fn chain_report(&self, chain_id: Option<&str>) -> Result<Vec<ChainReport>, QueryError>;

    /// Account one served monitoring request
    fn record_request(&self, success: bool, elapsed: Duration);
}
