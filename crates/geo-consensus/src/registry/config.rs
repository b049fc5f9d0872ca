//! Registry configuration and the default bootstrap topology

use crate::domain::{GeoConfig, GeoError, GeoLocation, NodeId, TaskSchedule};
use serde::{Deserialize, Serialize};

/// A node every new chain is seeded with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BootstrapNode {
    pub node_id: NodeId,
    #[serde(flatten)]
    pub location: GeoLocation,
}

impl BootstrapNode {
    pub fn new(node_id: NodeId, location: GeoLocation) -> Self {
        Self { node_id, location }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Configuration for chains created without an explicit one
    pub geo: GeoConfig,
    pub schedule: TaskSchedule,
    pub bootstrap: Vec<BootstrapNode>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            geo: GeoConfig::default(),
            schedule: TaskSchedule::default(),
            bootstrap: default_bootstrap_nodes(),
        }
    }
}

impl RegistryConfig {
    /// Check the schedule and every bootstrap node before anything is spawned.
    pub fn validate(&self) -> Result<(), GeoError> {
        self.schedule.validate()?;
        for node in &self.bootstrap {
            if node.node_id == 0 {
                return Err(GeoError::InvalidNodeId);
            }
            node.location.validate()?;
        }
        Ok(())
    }
}

/// Five well-known locations across four continents.
pub fn default_bootstrap_nodes() -> Vec<BootstrapNode> {
    vec![
        BootstrapNode::new(
            1,
            GeoLocation::new(37.7749, -122.4194, "us-west", "us-west-1a", "sf-dc1"),
        ),
        BootstrapNode::new(
            2,
            GeoLocation::new(40.7128, -74.0060, "us-east", "us-east-1a", "ny-dc1"),
        ),
        BootstrapNode::new(
            3,
            GeoLocation::new(51.5074, -0.1278, "eu-west", "eu-west-1a", "london-dc1"),
        ),
        BootstrapNode::new(
            4,
            GeoLocation::new(
                35.6762,
                139.6503,
                "asia-northeast",
                "asia-northeast-1a",
                "tokyo-dc1",
            ),
        ),
        BootstrapNode::new(
            5,
            GeoLocation::new(
                -33.8688,
                151.2093,
                "asia-southeast",
                "asia-southeast-2a",
                "sydney-dc1",
            ),
        ),
    ]
}
