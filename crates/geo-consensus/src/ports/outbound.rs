//! Driven ports (Outbound dependencies)

use crate::domain::{ChainError, GeoLocation, NodeId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// The underlying replicated-log chain of one channel.
///
/// The geo layer never touches consensus safety: it wraps an implementation
/// of this trait, forwards calls, and only advises on leadership.
#[async_trait]
pub trait ReplicatedChain: Send + Sync {
    /// Begin participating in consensus
    async fn start(&self) -> Result<(), ChainError>;

    /// Stop the chain; further orders fail
    async fn halt(&self);

    /// Submit a normal payload for ordering
    async fn order(&self, payload: Vec<u8>) -> Result<(), ChainError>;

    /// Submit a configuration update
    async fn configure(&self, payload: Vec<u8>) -> Result<(), ChainError>;

    /// Hint that `target` should take leadership. Protocols without
    /// leadership transfer may ignore it.
    async fn transfer_leadership(&self, _target: NodeId) -> Result<(), ChainError> {
        Ok(())
    }

    /// Whether the chain has entered an unrecoverable state
    fn is_errored(&self) -> bool;
}

/// Builds the protocol's chain for a channel.
///
/// Failure is fatal for that channel: the registry does not retry.
#[async_trait]
pub trait ChainFactory: Send + Sync {
    type Chain: ReplicatedChain + 'static;

    async fn create_chain(&self, chain_id: &str) -> Result<Self::Chain, ChainError>;
}

/// Source of inter-node latency samples.
///
/// Implementations must return a non-negative duration and should return
/// lower values for pairs in the same region.
pub trait LatencyProbe: Send + Sync {
    fn measure(&self, from: &GeoLocation, to: &GeoLocation) -> Duration;
}

/// Wall clock used for last-seen stamps and staleness checks.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Default time source using system time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
