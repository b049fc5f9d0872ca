//! In-memory replicated chain
//!
//! Records what it is asked to do. Used by the node binary until a real
//! protocol is plugged in, and by tests.

use crate::domain::{ChainError, NodeId};
use crate::ports::{ChainFactory, ReplicatedChain};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct InMemoryChain {
    running: AtomicBool,
    halted: AtomicBool,
    ordered: RwLock<Vec<Vec<u8>>>,
    config_updates: AtomicU64,
    leader_hint: RwLock<Option<NodeId>>,
}

impl InMemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn ordered_count(&self) -> usize {
        self.ordered.read().len()
    }

    pub fn config_updates(&self) -> u64 {
        self.config_updates.load(Ordering::SeqCst)
    }

    /// Last node advised to take leadership
    pub fn leader_hint(&self) -> Option<NodeId> {
        *self.leader_hint.read()
    }

    fn ensure_running(&self) -> Result<(), ChainError> {
        if self.halted.load(Ordering::SeqCst) {
            return Err(ChainError::Halted);
        }
        if !self.is_running() {
            return Err(ChainError::NotStarted);
        }
        Ok(())
    }
}

#[async_trait]
impl ReplicatedChain for InMemoryChain {
    async fn start(&self) -> Result<(), ChainError> {
        if self.halted.load(Ordering::SeqCst) {
            return Err(ChainError::Halted);
        }
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn halt(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.halted.store(true, Ordering::SeqCst);
    }

    async fn order(&self, payload: Vec<u8>) -> Result<(), ChainError> {
        self.ensure_running()?;
        self.ordered.write().push(payload);
        Ok(())
    }

    async fn configure(&self, _payload: Vec<u8>) -> Result<(), ChainError> {
        self.ensure_running()?;
        self.config_updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn transfer_leadership(&self, target: NodeId) -> Result<(), ChainError> {
        self.ensure_running()?;
        *self.leader_hint.write() = Some(target);
        Ok(())
    }

    fn is_errored(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }
}

/// Creates an [`InMemoryChain`] per channel, optionally refusing some ids.
#[derive(Debug, Default)]
pub struct InMemoryChainFactory {
    refused: HashSet<String>,
}

impl InMemoryChainFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory that fails to build the listed channels.
    pub fn refusing<I, S>(chain_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            refused: chain_ids.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl ChainFactory for InMemoryChainFactory {
    type Chain = InMemoryChain;

    async fn create_chain(&self, chain_id: &str) -> Result<InMemoryChain, ChainError> {
        if self.refused.contains(chain_id) {
            return Err(ChainError::Unavailable(format!(
                "cannot construct chain {chain_id}"
            )));
        }
        Ok(InMemoryChain::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_order_requires_start() {
        let chain = InMemoryChain::new();
        assert_eq!(chain.order(vec![1]).await, Err(ChainError::NotStarted));

        chain.start().await.unwrap();
        chain.order(vec![1]).await.unwrap();
        chain.configure(vec![]).await.unwrap();
        assert_eq!(chain.ordered_count(), 1);
        assert_eq!(chain.config_updates(), 1);
    }

    #[tokio::test]
    async fn test_halt_is_terminal() {
        let chain = InMemoryChain::new();
        chain.start().await.unwrap();
        chain.halt().await;

        assert!(chain.is_errored());
        assert_eq!(chain.order(vec![1]).await, Err(ChainError::Halted));
        assert_eq!(chain.start().await, Err(ChainError::Halted));
    }

    #[tokio::test]
    async fn test_factory_refuses_listed_ids() {
        let factory = InMemoryChainFactory::refusing(["broken"]);
        assert!(factory.create_chain("ok").await.is_ok());
        assert!(matches!(
            factory.create_chain("broken").await,
            Err(ChainError::Unavailable(_))
        ));
    }
}
