//! Great-circle distance and the pairwise proximity matrix
//!
//! Proximity is `1 / (1 + km)`, multiplied by the region weight for peers in
//! the same region and by [`SAME_ZONE_BONUS`] for peers in the same zone.

use super::{GeoConfig, GeoLocation, NodeId};
use std::collections::{BTreeMap, HashMap};

/// Mean Earth radius used by the haversine formula
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Multiplier applied when two locations share a zone label
pub const SAME_ZONE_BONUS: f64 = 1.5;

/// Symmetric proximity scores over every registered node pair.
#[derive(Clone, Debug, Default)]
pub struct ProximityEngine {
    matrix: HashMap<NodeId, HashMap<NodeId, f64>>,
}

impl ProximityEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Haversine distance in kilometres between two locations given in degrees.
    pub fn distance(a: &GeoLocation, b: &GeoLocation) -> f64 {
        let lat1 = a.latitude.to_radians();
        let lat2 = b.latitude.to_radians();
        let d_lat = (b.latitude - a.latitude).to_radians();
        let d_lon = (b.longitude - a.longitude).to_radians();

        let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        // rounding can push h marginally past 1 for antipodal points
        let h = h.clamp(0.0, 1.0);
        let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

        EARTH_RADIUS_KM * c
    }

    /// Weighted affinity between two locations, higher is closer.
    pub fn score(a: &GeoLocation, b: &GeoLocation, config: &GeoConfig) -> f64 {
        let mut score = 1.0 / (1.0 + Self::distance(a, b));

        if a.same_region(b) {
            score *= config.region_weight;
        }
        if a.same_zone(b) {
            score *= SAME_ZONE_BONUS;
        }

        score
    }

    /// Recompute the row and column of `node_id` against `others`.
    ///
    /// Both `(node_id, other)` and `(other, node_id)` are written so the
    /// matrix stays symmetric. Entries `others` yields for `node_id` itself
    /// are skipped.
    pub fn refresh_matrix<'a, I>(
        &mut self,
        node_id: NodeId,
        location: &GeoLocation,
        others: I,
        config: &GeoConfig,
    ) where
        I: IntoIterator<Item = (NodeId, &'a GeoLocation)>,
    {
        self.matrix.entry(node_id).or_default();

        for (other_id, other_location) in others {
            if other_id == node_id {
                continue;
            }
            let score = Self::score(location, other_location, config);
            self.matrix.entry(node_id).or_default().insert(other_id, score);
            self.matrix.entry(other_id).or_default().insert(node_id, score);
        }
    }

    pub fn get(&self, a: NodeId, b: NodeId) -> Option<f64> {
        self.matrix.get(&a).and_then(|row| row.get(&b)).copied()
    }

    /// Mean of a node's row restricted to `peers`, excluding itself.
    pub fn mean_to<I>(&self, node_id: NodeId, peers: I) -> Option<f64>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let row = self.matrix.get(&node_id)?;
        let (sum, count) = peers
            .into_iter()
            .filter(|peer| *peer != node_id)
            .filter_map(|peer| row.get(&peer))
            .fold((0.0, 0usize), |(sum, count), score| (sum + score, count + 1));

        (count > 0).then(|| sum / count as f64)
    }

    /// Ordered deep copy for snapshots.
    pub fn to_sorted(&self) -> BTreeMap<NodeId, BTreeMap<NodeId, f64>> {
        self.matrix
            .iter()
            .map(|(id, row)| (*id, row.iter().map(|(k, v)| (*k, *v)).collect()))
            .collect()
    }
}
