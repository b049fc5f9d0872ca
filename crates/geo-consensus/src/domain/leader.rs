//! Geo-aware leader scoring and selection
//!
//! A candidate's score is a single scalar:
//!
//! ```text
//! score = mean_proximity * proximity_weight
//!       + 0.1 * nodes_in_region            (only if the region has > 1 node)
//!       - mean_latency_ms / 1000
//!       - load_factor                      (only if load balancing is enabled)
//! ```
//!
//! Scores only rank candidates within one selection; they have no bounds.
//! Equal scores are broken by ascending node id.

use super::{GeoConfig, GeoTopology, NodeId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Per-node bonus multiplier when a region holds more than one node
pub const REGION_CONCENTRATION_BONUS: f64 = 0.1;

/// Nodes not seen for longer than this are treated as unresponsive
pub const STALE_AFTER_SECS: i64 = 60;

pub const STALE_LOAD_FACTOR: f64 = 1.0;
pub const BASELINE_LOAD_FACTOR: f64 = 0.1;

/// A scored candidate.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CandidateScore {
    pub node_id: NodeId,
    pub score: f64,
}

/// Outcome of a leader selection.
#[derive(Clone, Debug, PartialEq)]
pub enum Election {
    /// No candidates were supplied
    NoCandidates,
    /// None of the candidates is registered; the first input id is returned
    /// without touching any state
    Fallback(NodeId),
    /// The best scored candidate was elected
    Elected {
        leader: NodeId,
        region: String,
        ranking: Vec<CandidateScore>,
    },
}

impl Election {
    /// The advised leader, `None` for an empty candidate list.
    pub fn leader(&self) -> Option<NodeId> {
        match self {
            Election::NoCandidates => None,
            Election::Fallback(id) => Some(*id),
            Election::Elected { leader, .. } => Some(*leader),
        }
    }

    pub fn is_elected(&self) -> bool {
        matches!(self, Election::Elected { .. })
    }
}

/// Read-only scoring view over a topology.
pub struct LeaderSelector<'a> {
    topology: &'a GeoTopology,
    config: &'a GeoConfig,
    now: DateTime<Utc>,
}

impl<'a> LeaderSelector<'a> {
    pub fn new(topology: &'a GeoTopology, config: &'a GeoConfig, now: DateTime<Utc>) -> Self {
        Self {
            topology,
            config,
            now,
        }
    }

    /// Score of a registered node, `None` when unknown.
    pub fn calculate_leader_score(&self, node_id: NodeId) -> Option<f64> {
        let node = self.topology.node(node_id)?;
        let mut score = 0.0;

        let peers = self.topology.nodes().map(|n| n.node_id);
        if let Some(mean) = self.topology.proximity().mean_to(node_id, peers) {
            score += mean * self.config.proximity_weight;
        }

        let in_region = self.topology.count_in_region(&node.location.region);
        if in_region > 1 {
            score += REGION_CONCENTRATION_BONUS * in_region as f64;
        }

        let latency_ms = node.average_latency().as_millis() as f64;
        score -= latency_ms / 1000.0;

        if self.config.load_balance_enabled {
            score -= self.calculate_load_factor(node_id);
        }

        Some(score)
    }

    /// 1.0 for nodes unseen for over a minute, 0.1 otherwise.
    pub fn calculate_load_factor(&self, node_id: NodeId) -> f64 {
        let Some(node) = self.topology.node(node_id) else {
            return 0.0;
        };
        let idle = self.now.signed_duration_since(node.last_seen);
        if idle > chrono::Duration::seconds(STALE_AFTER_SECS) {
            STALE_LOAD_FACTOR
        } else {
            BASELINE_LOAD_FACTOR
        }
    }

    /// Registered candidates sorted best first. Unknown and repeated ids
    /// are skipped.
    pub fn rank(&self, candidates: &[NodeId]) -> Vec<CandidateScore> {
        let mut seen = HashSet::new();
        let mut ranking: Vec<CandidateScore> = candidates
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|&node_id| {
                self.calculate_leader_score(node_id)
                    .map(|score| CandidateScore { node_id, score })
            })
            .collect();

        ranking.sort_by(|a, b| match b.score.total_cmp(&a.score) {
            Ordering::Equal => a.node_id.cmp(&b.node_id),
            other => other,
        });
        ranking
    }
}

/// Pick the best candidate and apply the election to `topology`.
///
/// On [`Election::Elected`] the winner becomes the only flagged leader, its
/// region's leader entry is overwritten and every scored candidate gets its
/// rank within its region. The other outcomes leave `topology` untouched.
/// The caller must hold exclusive access for the whole call.
pub fn select_optimal_leader(
    topology: &mut GeoTopology,
    config: &GeoConfig,
    now: DateTime<Utc>,
    candidates: &[NodeId],
) -> Election {
    let Some(&first) = candidates.first() else {
        return Election::NoCandidates;
    };

    let ranking = LeaderSelector::new(topology, config, now).rank(candidates);
    let Some(best) = ranking.first() else {
        return Election::Fallback(first);
    };
    let leader = best.node_id;

    let mut per_region: HashMap<String, u32> = HashMap::new();
    for candidate in &ranking {
        if let Some(node) = topology.node_mut(candidate.node_id) {
            let rank = per_region.entry(node.location.region.clone()).or_insert(0);
            *rank += 1;
            node.region_rank = *rank;
        }
    }

    match topology.mark_leader(leader) {
        Some(region) => Election::Elected {
            leader,
            region,
            ranking,
        },
        None => Election::Fallback(first),
    }
}
