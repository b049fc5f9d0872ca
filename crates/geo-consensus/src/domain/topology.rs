//! Node set, proximity matrix and region leaders of a single chain

use super::{GeoConfig, GeoError, GeoLocation, GeoNode, NodeId, ProximityEngine};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};

/// Everything a chain knows about where its members are.
///
/// Not synchronised; the owning chain wraps it in its lock.
#[derive(Clone, Debug, Default)]
pub struct GeoTopology {
    nodes: HashMap<NodeId, GeoNode>,
    proximity: ProximityEngine,
    region_leaders: HashMap<String, NodeId>,
}

impl GeoTopology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a node and recompute its proximity row/column.
    ///
    /// Returns `true` when the node was not known before. An existing node
    /// keeps its leader flag and latency map; its location is replaced and
    /// `last_seen` refreshed.
    pub fn register_node(
        &mut self,
        node_id: NodeId,
        location: GeoLocation,
        now: DateTime<Utc>,
        config: &GeoConfig,
    ) -> Result<bool, GeoError> {
        if node_id == 0 {
            return Err(GeoError::InvalidNodeId);
        }
        location.validate()?;

        let is_new = match self.nodes.get_mut(&node_id) {
            Some(node) => {
                node.location = location;
                node.last_seen = now;
                false
            }
            None => {
                self.nodes
                    .insert(node_id, GeoNode::new(node_id, location, now));
                true
            }
        };

        let nodes = &self.nodes;
        if let Some(node) = nodes.get(&node_id) {
            let others = nodes.iter().map(|(id, n)| (*id, &n.location));
            self.proximity
                .refresh_matrix(node_id, &node.location, others, config);
        }

        Ok(is_new)
    }

    pub fn node(&self, node_id: NodeId) -> Option<&GeoNode> {
        self.nodes.get(&node_id)
    }

    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut GeoNode> {
        self.nodes.get_mut(&node_id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GeoNode> {
        self.nodes.values()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut GeoNode> {
        self.nodes.values_mut()
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node ids in ascending order
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<_> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn proximity(&self) -> &ProximityEngine {
        &self.proximity
    }

    pub fn region_leaders(&self) -> &HashMap<String, NodeId> {
        &self.region_leaders
    }

    pub fn count_in_region(&self, region: &str) -> usize {
        self.nodes
            .values()
            .filter(|n| n.location.region == region)
            .count()
    }

    /// Distinct region labels, sorted
    pub fn unique_regions(&self) -> Vec<String> {
        self.nodes
            .values()
            .map(|n| n.location.region.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Make `leader_id` the only node with the leader flag and record it as
    /// its region's leader. Returns the region, or `None` if unknown.
    pub fn mark_leader(&mut self, leader_id: NodeId) -> Option<String> {
        let region = self.nodes.get(&leader_id)?.location.region.clone();

        for node in self.nodes.values_mut() {
            node.is_leader = node.node_id == leader_id;
        }
        self.region_leaders.insert(region.clone(), leader_id);

        Some(region)
    }
}
