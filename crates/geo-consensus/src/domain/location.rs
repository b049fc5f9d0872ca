//! Location and node entities

use super::GeoError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::collections::BTreeMap;
use std::time::Duration;

/// Caller-assigned node identifier. Zero is reserved.
pub type NodeId = u64;

/// Physical placement of a node.
///
/// Immutable once attached to a node; re-registration replaces it wholesale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Degrees, signed, in [-90, 90]
    pub latitude: f64,
    /// Degrees, signed, in [-180, 180]
    pub longitude: f64,
    pub region: String,
    pub zone: String,
    #[serde(rename = "datacenter")]
    pub data_center: String,
}

impl GeoLocation {
    pub fn new(
        latitude: f64,
        longitude: f64,
        region: impl Into<String>,
        zone: impl Into<String>,
        data_center: impl Into<String>,
    ) -> Self {
        Self {
            latitude,
            longitude,
            region: region.into(),
            zone: zone.into(),
            data_center: data_center.into(),
        }
    }

    /// Reject coordinates that would poison distance calculations.
    pub fn validate(&self) -> Result<(), GeoError> {
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let lon_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);
        if lat_ok && lon_ok {
            Ok(())
        } else {
            Err(GeoError::InvalidCoordinates {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }

    pub fn same_region(&self, other: &GeoLocation) -> bool {
        self.region == other.region
    }

    pub fn same_zone(&self, other: &GeoLocation) -> bool {
        self.zone == other.zone
    }
}

/// A chain member with its location and runtime state.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeoNode {
    pub node_id: NodeId,
    pub location: GeoLocation,
    pub last_seen: DateTime<Utc>,
    /// Last measured latency to each peer
    #[serde_as(as = "BTreeMap<_, DurationMilliSeconds<u64>>")]
    #[serde(rename = "latency_map")]
    pub latency: BTreeMap<NodeId, Duration>,
    pub is_leader: bool,
    /// 1-based rank among scored candidates of the same region at the last
    /// election, 0 when never ranked
    pub region_rank: u32,
}

impl GeoNode {
    pub fn new(node_id: NodeId, location: GeoLocation, now: DateTime<Utc>) -> Self {
        Self {
            node_id,
            location,
            last_seen: now,
            latency: BTreeMap::new(),
            is_leader: false,
            region_rank: 0,
        }
    }

    /// Mean of the latency map, zero when nothing was measured yet.
    pub fn average_latency(&self) -> Duration {
        if self.latency.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.latency.values().sum();
        total / self.latency.len() as u32
    }
}
