use crate::domain::{GeoConfig, GeoMetrics, GeoTopology, TopologySnapshot};

/// Mutable state of one geo chain.
///
/// Guarded as a whole by the chain's single reader/writer lock, so a reader
/// never sees the node set and the matrix out of step.
#[derive(Debug, Default)]
pub struct ChainState {
    pub topology: GeoTopology,
    pub metrics: GeoMetrics,
}

impl ChainState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topology_snapshot(&self, config: &GeoConfig) -> TopologySnapshot {
        TopologySnapshot::capture(&self.topology, config)
    }
}
