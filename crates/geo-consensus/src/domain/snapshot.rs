//! Point-in-time copies handed to monitoring callers

use super::{GeoConfig, GeoMetrics, GeoNode, GeoTopology, NodeId};
use serde::Serialize;
use serde_with::{serde_as, DurationSeconds};
use std::collections::BTreeMap;
use std::time::Duration;

/// Deep copy of a chain's topology. Shares nothing with the live state.
#[derive(Clone, Debug, Serialize)]
pub struct TopologySnapshot {
    /// Nodes ordered by id
    pub nodes: Vec<GeoNode>,
    pub region_leaders: BTreeMap<String, NodeId>,
    pub total_nodes: usize,
    pub regions: Vec<String>,
    pub config: GeoConfig,
    pub proximity_matrix: BTreeMap<NodeId, BTreeMap<NodeId, f64>>,
}

impl TopologySnapshot {
    pub fn capture(topology: &GeoTopology, config: &GeoConfig) -> Self {
        let nodes: Vec<GeoNode> = topology
            .node_ids()
            .into_iter()
            .filter_map(|id| topology.node(id).cloned())
            .collect();

        Self {
            total_nodes: nodes.len(),
            nodes,
            region_leaders: topology
                .region_leaders()
                .iter()
                .map(|(region, id)| (region.clone(), *id))
                .collect(),
            regions: topology.unique_regions(),
            config: config.clone(),
            proximity_matrix: topology.proximity().to_sorted(),
        }
    }

    /// Every listed node pair has a matrix entry and both directions agree.
    pub fn is_consistent(&self) -> bool {
        self.nodes.iter().all(|a| {
            self.nodes.iter().filter(|b| b.node_id != a.node_id).all(|b| {
                let ab = self
                    .proximity_matrix
                    .get(&a.node_id)
                    .and_then(|row| row.get(&b.node_id));
                let ba = self
                    .proximity_matrix
                    .get(&b.node_id)
                    .and_then(|row| row.get(&a.node_id));
                ab.is_some() && ab == ba
            })
        })
    }
}

/// Metrics and topology of one chain.
#[derive(Clone, Debug, Serialize)]
pub struct ChainReport {
    pub chain_id: String,
    pub metrics: GeoMetrics,
    pub topology: TopologySnapshot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    ShuttingDown,
}

/// Liveness summary of the registry.
#[serde_as]
#[derive(Clone, Debug, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub active_chains: usize,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "uptime_secs")]
    pub uptime: Duration,
}
