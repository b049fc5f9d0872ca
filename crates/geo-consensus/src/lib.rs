//! # geo-consensus
//!
//! Geography-aware augmentation layer for replicated-log consensus chains.
//!
//! ## Architecture
//!
//! The layer wraps a protocol's own chain (see [`ports::ReplicatedChain`])
//! and keeps, per chain:
//!
//! - the registered nodes and their locations,
//! - a symmetric proximity matrix derived from great-circle distance,
//!   region and zone,
//! - per-region leaders and a single advised leader,
//! - latency, election and throughput metrics.
//!
//! Consensus safety is untouched: the layer only advises the wrapped chain
//! on leadership and observes traffic.
//!
//! ```text
//!                 ┌──────────────────── ChainRegistry ────────────────────┐
//!  ChainFactory ──┤  GeoChain ── RwLock<ChainState> ── network / tps tasks │── MonitoringApi
//!                 │  GeoChain ── ...                                       │
//!                 └────────────────── aggregation task ───────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geo_consensus::{ChainRegistry, InMemoryChainFactory, RegistryConfig, RegistryDeps};
//! use std::sync::Arc;
//!
//! let registry = ChainRegistry::new(RegistryDeps::new(
//!     Arc::new(InMemoryChainFactory::new()),
//!     RegistryConfig::default(),
//! ));
//!
//! let chain = registry.create_chain("mychannel").await?;
//! let election = chain.elect_leader(&[1, 2, 3]).await?;
//! registry.shutdown().await;
//! ```

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod registry;
pub mod service;
pub mod state;

// Re-export main types
pub use adapters::{
    FixedTimeSource, InMemoryChain, InMemoryChainFactory, SimulatedLatencyProbe,
};
pub use domain::{
    ChainError, ChainReport, Election, GeoConfig, GeoError, GeoLocation, GeoMetrics, GeoNode,
    GeoResult, HealthReport, HealthStatus, NodeId, QueryError, RegistryMetrics, TaskSchedule,
    TopologySnapshot,
};
pub use ports::{
    ChainFactory, LatencyProbe, MonitoringApi, ReplicatedChain, SystemTimeSource, TimeSource,
};
pub use registry::{BootstrapNode, ChainRegistry, RegistryConfig, RegistryDeps};
pub use service::{GeoChain, GeoChainDeps, NetworkRefresh};
