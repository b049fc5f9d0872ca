//! Geo Chain Service
//!
//! # Architecture
//! - Wraps the protocol's own chain by composition; consensus safety stays
//!   with the wrapped chain, this layer only advises on leadership
//! - One reader/writer lock over all per-chain state, never held across an
//!   `.await`
//! - Two periodic tasks per chain: network refresh and throughput refresh

mod monitor;
mod tasks;
mod throughput;

#[cfg(test)]
mod tests;

pub use monitor::NetworkRefresh;
pub(crate) use tasks::PeriodicTasks;

use crate::domain::{
    select_optimal_leader, ChainError, Election, GeoConfig, GeoLocation, GeoMetrics, GeoResult,
    NodeId, TaskSchedule, ThroughputTracker, TopologySnapshot,
};
use crate::metrics;
use crate::ports::{LatencyProbe, ReplicatedChain, TimeSource};
use crate::state::ChainState;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument, Span};

/// Dependencies for GeoChain
pub struct GeoChainDeps<C> {
    pub chain_id: String,
    /// The protocol's chain being wrapped
    pub base: Arc<C>,
    pub config: GeoConfig,
    pub schedule: TaskSchedule,
    pub probe: Arc<dyn LatencyProbe>,
    pub time: Arc<dyn TimeSource>,
    /// Every log line of the chain is emitted inside this span
    pub span: Span,
}

struct ChainCore<C> {
    chain_id: String,
    base: Arc<C>,
    config: GeoConfig,
    state: RwLock<ChainState>,
    probe: Arc<dyn LatencyProbe>,
    time: Arc<dyn TimeSource>,
    span: Span,
}

impl<C> ChainCore<C> {
    fn network_tick(&self) -> NetworkRefresh {
        let _entered = self.span.enter();
        let now = self.time.now();

        let refresh = {
            let mut state = self.state.write();
            monitor::refresh_network(&mut state, self.probe.as_ref(), &self.config, now)
        };

        metrics::record_network_refresh(&self.chain_id);
        for (pair, mean) in &refresh.slow_pairs {
            warn!(
                region_pair = %pair,
                mean_ms = mean.as_millis() as u64,
                threshold_ms = self.config.latency_threshold.as_millis() as u64,
                "Region pair latency above threshold"
            );
        }
        debug!(
            samples = refresh.samples,
            cross_region = refresh.cross_region,
            "Network metrics refreshed"
        );
        refresh
    }

    fn throughput_tick(&self, tracker: &mut ThroughputTracker) {
        let tps = {
            let mut state = self.state.write();
            throughput::refresh_throughput(&mut state, tracker, tokio::time::Instant::now())
        };
        metrics::set_throughput(&self.chain_id, tps);
        debug!(parent: &self.span, throughput_per_second = tps, "Throughput refreshed");
    }
}

/// Geo-aware wrapper around one replicated-log chain.
///
/// Owns the chain's node set, proximity matrix, region leaders and metrics,
/// plus the two periodic tasks started at construction.
pub struct GeoChain<C> {
    core: Arc<ChainCore<C>>,
    tasks: PeriodicTasks,
}

impl<C> GeoChain<C>
where
    C: ReplicatedChain + 'static,
{
    /// Build the chain and start its background tasks.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(deps: GeoChainDeps<C>) -> Self {
        let core = Arc::new(ChainCore {
            chain_id: deps.chain_id,
            base: deps.base,
            config: deps.config,
            state: RwLock::new(ChainState::new()),
            probe: deps.probe,
            time: deps.time,
            span: deps.span,
        });

        let tasks = PeriodicTasks::new(deps.schedule.shutdown_grace);

        let network = Arc::clone(&core);
        tasks.spawn(
            "network_monitor",
            deps.schedule.network_refresh,
            core.span.clone(),
            move || {
                network.network_tick();
            },
        );

        let throughput = Arc::clone(&core);
        let mut tracker = ThroughputTracker::new();
        tasks.spawn(
            "chain_metrics",
            deps.schedule.throughput_refresh,
            core.span.clone(),
            move || throughput.throughput_tick(&mut tracker),
        );

        info!(parent: &core.span, "Geo chain created");
        Self { core, tasks }
    }

    pub fn chain_id(&self) -> &str {
        &self.core.chain_id
    }

    pub fn config(&self) -> &GeoConfig {
        &self.core.config
    }

    /// The wrapped protocol chain
    pub fn base(&self) -> &Arc<C> {
        &self.core.base
    }

    /// Insert or update a node and recompute its proximity entries.
    pub fn register_node(&self, node_id: NodeId, location: GeoLocation) -> GeoResult<()> {
        let _entered = self.core.span.enter();
        let region = location.region.clone();
        let now = self.core.time.now();

        let is_new = self
            .core
            .state
            .write()
            .topology
            .register_node(node_id, location, now, &self.core.config)?;

        metrics::record_node_registered();
        info!(node_id, region = %region, is_new, "Node registered");
        Ok(())
    }

    /// Score the candidates and mark the best one as leader.
    ///
    /// Scoring and the leader flag update happen under one write lock.
    pub fn select_optimal_leader(&self, candidates: &[NodeId]) -> Election {
        let _entered = self.core.span.enter();
        let now = self.core.time.now();

        let election = {
            let mut state = self.core.state.write();
            let election =
                select_optimal_leader(&mut state.topology, &self.core.config, now, candidates);
            if election.is_elected() {
                state.metrics.leader_elections += 1;
            }
            election
        };

        match &election {
            Election::NoCandidates => warn!("Leader selection called without candidates"),
            Election::Fallback(first) => {
                warn!(fallback = *first, "No registered candidate, falling back to first")
            }
            Election::Elected {
                leader,
                region,
                ranking,
            } => {
                metrics::record_leader_elected(&self.core.chain_id);
                info!(
                    leader = *leader,
                    region = %region,
                    score = ?ranking.first().map(|c| c.score),
                    candidates = ranking.len(),
                    "Leader elected"
                );
            }
        }
        election
    }

    /// Select a leader and advise the wrapped chain when one was scored.
    pub async fn elect_leader(&self, candidates: &[NodeId]) -> Result<Election, ChainError> {
        let election = self.select_optimal_leader(candidates);
        if let Election::Elected { leader, .. } = &election {
            self.core
                .base
                .transfer_leadership(*leader)
                .instrument(self.core.span.clone())
                .await?;
        }
        Ok(election)
    }

    /// Count transactions ordered on this chain.
    pub fn record_transactions(&self, count: u64) {
        let mut state = self.core.state.write();
        state.metrics.total_transactions = state.metrics.total_transactions.saturating_add(count);
    }

    pub fn metrics_snapshot(&self) -> GeoMetrics {
        self.core.state.read().metrics.clone()
    }

    pub fn topology_snapshot(&self) -> TopologySnapshot {
        self.core.state.read().topology_snapshot(&self.core.config)
    }

    /// Run one network refresh now, outside the schedule.
    pub fn refresh_network_metrics(&self) -> NetworkRefresh {
        self.core.network_tick()
    }

    /// Stop the background tasks. Returns once they have finished or the
    /// grace period has passed; safe to call more than once.
    pub async fn shutdown(&self) {
        if self.tasks.stop().instrument(self.core.span.clone()).await {
            info!(parent: &self.core.span, "Geo chain stopped");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.tasks.is_stopped()
    }
}

#[async_trait]
impl<C> ReplicatedChain for GeoChain<C>
where
    C: ReplicatedChain + 'static,
{
    async fn start(&self) -> Result<(), ChainError> {
        self.core.base.start().await
    }

    async fn halt(&self) {
        self.core.base.halt().await;
        self.shutdown().await;
    }

    async fn order(&self, payload: Vec<u8>) -> Result<(), ChainError> {
        self.core.base.order(payload).await?;
        self.record_transactions(1);
        Ok(())
    }

    async fn configure(&self, payload: Vec<u8>) -> Result<(), ChainError> {
        self.core.base.configure(payload).await
    }

    /// Only a registered target is forwarded; unknown targets are ignored.
    async fn transfer_leadership(&self, target: NodeId) -> Result<(), ChainError> {
        self.elect_leader(&[target]).await.map(|_| ())
    }

    fn is_errored(&self) -> bool {
        self.core.base.is_errored()
    }
}
