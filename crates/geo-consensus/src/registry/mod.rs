//! Chain Registry
//!
//! Creates one [`GeoChain`] per channel through the protocol's
//! [`ChainFactory`], keeps them by id and rolls their metrics up
//! periodically for the monitoring surface.
//!
//! The id-to-chain map has its own lock, separate from every chain's state
//! lock, so creating or dropping a chain never waits on a chain's tick.

mod config;


pub use config::*;

use crate::adapters::SimulatedLatencyProbe;
use crate::domain::{
    ChainReport, GeoConfig, GeoError, GeoResult, HealthReport, HealthStatus, QueryError,
    RegistryMetrics, TopologySnapshot,
};
use crate::ports::{ChainFactory, LatencyProbe, MonitoringApi, SystemTimeSource, TimeSource};
use crate::service::{GeoChain, GeoChainDeps, PeriodicTasks};
use futures::future::join_all;
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, Instrument, Span};

/// Dependencies for ChainRegistry
pub struct RegistryDeps<F> {
    pub factory: Arc<F>,
    pub config: RegistryConfig,
    /// Shared by every chain the registry creates
    pub probe: Arc<dyn LatencyProbe>,
    pub time: Arc<dyn TimeSource>,
    /// Parent of every chain's span
    pub span: Span,
}

impl<F> RegistryDeps<F> {
    /// Simulated latency, system clock and a `geo_registry` span.
    pub fn new(factory: Arc<F>, config: RegistryConfig) -> Self {
        Self {
            factory,
            config,
            probe: Arc::new(SimulatedLatencyProbe::default()),
            time: Arc::new(SystemTimeSource),
            span: info_span!("geo_registry"),
        }
    }
}

type ChainMap<C> = RwLock<HashMap<String, Arc<GeoChain<C>>>>;

/// State shared with the aggregation task.
struct RegistryCore<C> {
    chains: ChainMap<C>,
    aggregate: RwLock<RegistryMetrics>,
}

impl<C> RegistryCore<C>
where
    C: crate::ports::ReplicatedChain + 'static,
{
    fn managed(&self) -> Vec<Arc<GeoChain<C>>> {
        self.chains.read().values().cloned().collect()
    }

    fn refresh_aggregate(&self) -> usize {
        let chain_metrics: BTreeMap<_, _> = self
            .managed()
            .iter()
            .map(|chain| (chain.chain_id().to_string(), chain.metrics_snapshot()))
            .collect();
        let active = chain_metrics.len();

        let mut aggregate = self.aggregate.write();
        aggregate.active_chains = active;
        aggregate.chain_metrics = chain_metrics;
        active
    }
}

#[derive(Default)]
struct RequestStats {
    total: AtomicU64,
    failed: AtomicU64,
    elapsed_nanos: AtomicU64,
}

impl RequestStats {
    fn record(&self, success: bool, elapsed: Duration) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.elapsed_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    fn apply_to(&self, metrics: &mut RegistryMetrics) {
        let total = self.total.load(Ordering::Relaxed);
        metrics.total_requests = total;
        metrics.failed_requests = self.failed.load(Ordering::Relaxed);
        metrics.avg_response_time = if total == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.elapsed_nanos.load(Ordering::Relaxed) / total)
        };
    }
}

/// Owner of every geo chain in the process.
pub struct ChainRegistry<F: ChainFactory> {
    factory: Arc<F>,
    config: RegistryConfig,
    probe: Arc<dyn LatencyProbe>,
    time: Arc<dyn TimeSource>,
    span: Span,
    core: Arc<RegistryCore<F::Chain>>,
    accepting: AtomicBool,
    requests: RequestStats,
    started_at: Instant,
    tasks: PeriodicTasks,
}

impl<F: ChainFactory> ChainRegistry<F> {
    /// Build the registry and start the aggregation task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(deps: RegistryDeps<F>) -> Self {
        let core = Arc::new(RegistryCore {
            chains: RwLock::new(HashMap::new()),
            aggregate: RwLock::new(RegistryMetrics::default()),
        });

        let tasks = PeriodicTasks::new(deps.config.schedule.shutdown_grace);
        let aggregator = Arc::clone(&core);
        tasks.spawn(
            "registry_aggregation",
            deps.config.schedule.aggregation,
            deps.span.clone(),
            move || {
                let active = aggregator.refresh_aggregate();
                debug!(active_chains = active, "Chain metrics aggregated");
            },
        );

        Self {
            factory: deps.factory,
            config: deps.config,
            probe: deps.probe,
            time: deps.time,
            span: deps.span,
            core,
            accepting: AtomicBool::new(true),
            requests: RequestStats::default(),
            started_at: Instant::now(),
            tasks,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Create a chain with the registry's default geo configuration.
    pub async fn create_chain(&self, chain_id: &str) -> GeoResult<Arc<GeoChain<F::Chain>>> {
        self.create_chain_with_config(chain_id, self.config.geo.clone())
            .await
    }

    /// Build the protocol chain, wrap it and seed it with the bootstrap
    /// nodes.
    ///
    /// Fails with [`GeoError::ChainAlreadyExists`] for a known id, and with
    /// the factory's error when the protocol chain cannot be built.
    pub async fn create_chain_with_config(
        &self,
        chain_id: &str,
        config: GeoConfig,
    ) -> GeoResult<Arc<GeoChain<F::Chain>>> {
        if !self.is_accepting() {
            return Err(GeoError::ShuttingDown);
        }
        let exists = self.core.chains.read().contains_key(chain_id);
        if exists {
            return Err(GeoError::ChainAlreadyExists(chain_id.to_string()));
        }

        let base = match self.factory.create_chain(chain_id).await {
            Ok(base) => Arc::new(base),
            Err(e) => {
                error!(parent: &self.span, chain_id, error = %e, "Failed to construct chain");
                return Err(e.into());
            }
        };

        let chain = Arc::new(GeoChain::new(GeoChainDeps {
            chain_id: chain_id.to_string(),
            base,
            config,
            schedule: self.config.schedule.clone(),
            probe: Arc::clone(&self.probe),
            time: Arc::clone(&self.time),
            span: info_span!(parent: &self.span, "geo_chain", chain_id = %chain_id),
        }));

        for node in &self.config.bootstrap {
            if let Err(e) = chain.register_node(node.node_id, node.location.clone()) {
                chain.shutdown().await;
                return Err(e);
            }
        }

        let inserted = {
            let mut chains = self.core.chains.write();
            match chains.entry(chain_id.to_string()) {
                Entry::Vacant(slot) => {
                    slot.insert(Arc::clone(&chain));
                    true
                }
                Entry::Occupied(_) => false,
            }
        };
        if !inserted {
            chain.shutdown().await;
            return Err(GeoError::ChainAlreadyExists(chain_id.to_string()));
        }

        // shutdown may have drained the map while this chain was being built
        if !self.is_accepting() {
            self.core.chains.write().remove(chain_id);
            chain.shutdown().await;
            return Err(GeoError::ShuttingDown);
        }

        info!(
            parent: &self.span,
            chain_id,
            bootstrap_nodes = self.config.bootstrap.len(),
            "Chain created"
        );
        Ok(chain)
    }

    pub fn get_chain(&self, chain_id: &str) -> Option<Arc<GeoChain<F::Chain>>> {
        self.core.chains.read().get(chain_id).cloned()
    }

    /// Like [`ChainRegistry::get_chain`], with a typed error for unknown ids.
    pub fn chain(&self, chain_id: &str) -> GeoResult<Arc<GeoChain<F::Chain>>> {
        self.get_chain(chain_id)
            .ok_or_else(|| GeoError::ChainNotFound(chain_id.to_string()))
    }

    /// Managed chain ids, sorted
    pub fn chain_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.core.chains.read().keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    pub fn active_chains(&self) -> usize {
        self.core.chains.read().len()
    }

    /// Run one aggregation pass now. Returns the number of chains rolled up.
    pub fn refresh_aggregate(&self) -> usize {
        self.core.refresh_aggregate()
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    /// Stop serving queries, stop the aggregation task and every chain's
    /// tasks, then forget the chains. Later calls return immediately.
    pub async fn shutdown(&self) {
        if !self.accepting.swap(false, Ordering::SeqCst) {
            return;
        }
        info!(parent: &self.span, "Registry shutting down");

        self.tasks.stop().instrument(self.span.clone()).await;

        let chains: Vec<_> = self.core.chains.write().drain().map(|(_, c)| c).collect();
        join_all(chains.iter().map(|chain| chain.shutdown())).await;

        {
            let mut aggregate = self.core.aggregate.write();
            aggregate.active_chains = 0;
            aggregate.chain_metrics.clear();
        }
        info!(parent: &self.span, chains = chains.len(), "Registry stopped");
    }

    fn ensure_accepting(&self) -> Result<(), QueryError> {
        if self.is_accepting() {
            Ok(())
        } else {
            Err(QueryError::Unavailable)
        }
    }

    fn report(chain: &GeoChain<F::Chain>) -> ChainReport {
        ChainReport {
            chain_id: chain.chain_id().to_string(),
            metrics: chain.metrics_snapshot(),
            topology: chain.topology_snapshot(),
        }
    }
}

impl<F: ChainFactory> MonitoringApi for ChainRegistry<F> {
    fn aggregate_metrics(&self) -> Result<RegistryMetrics, QueryError> {
        self.ensure_accepting()?;
        let mut metrics = self.core.aggregate.read().clone();
        self.requests.apply_to(&mut metrics);
        Ok(metrics)
    }

    fn topology(&self) -> Result<BTreeMap<String, TopologySnapshot>, QueryError> {
        self.ensure_accepting()?;
        Ok(self
            .core
            .managed()
            .iter()
            .map(|chain| (chain.chain_id().to_string(), chain.topology_snapshot()))
            .collect())
    }

    fn health(&self) -> HealthReport {
        HealthReport {
            status: if self.is_accepting() {
                HealthStatus::Healthy
            } else {
                HealthStatus::ShuttingDown
            },
            active_chains: self.active_chains(),
            uptime: self.started_at.elapsed(),
        }
    }

    fn chain_report(&self, chain_id: Option<&str>) -> Result<Vec<ChainReport>, QueryError> {
        self.ensure_accepting()?;
        match chain_id {
            Some(id) => {
                let chain = self
                    .get_chain(id)
                    .ok_or_else(|| QueryError::NotFound(id.to_string()))?;
                Ok(vec![Self::report(&chain)])
            }
            None => {
                let mut reports: Vec<_> = self
                    .core
                    .managed()
                    .iter()
                    .map(|chain| Self::report(chain))
                    .collect();
                reports.sort_by(|a, b| a.chain_id.cmp(&b.chain_id));
                Ok(reports)
            }
        }
    }

    fn record_request(&self, success: bool, elapsed: Duration) {
        self.requests.record(success, elapsed);
    }
}
