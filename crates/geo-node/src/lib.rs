//! # Geo Node
//!
//! Wires a [`ChainRegistry`] and its monitoring endpoint into one process.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (file named by `GEO_CONFIG`, then env overrides)
//! 2. Initialise telemetry
//! 3. Build the registry over the in-memory chain factory
//! 4. Create the configured channels
//! 5. Bind the monitoring endpoint (fatal on failure) and serve it
//!
//! ## Shutdown Sequence
//!
//! 1. Stop accepting monitoring connections and drain open ones
//! 2. Stop every chain's background tasks via `ChainRegistry::shutdown`

pub mod config;

pub use config::{ConfigError, MonitorConfig, NodeConfig};

use anyhow::{Context, Result};
use geo_consensus::{ChainRegistry, InMemoryChainFactory, MonitoringApi, RegistryDeps};
use geo_monitor::MonitorServer;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info};

pub type NodeRegistry = ChainRegistry<InMemoryChainFactory>;

/// A started node: channels created, monitoring endpoint bound.
pub struct GeoNode {
    registry: Arc<NodeRegistry>,
    server: MonitorServer,
}

impl GeoNode {
    pub async fn start(config: NodeConfig) -> Result<Self> {
        config.validate().context("Refusing to start")?;

        let registry = Arc::new(ChainRegistry::new(RegistryDeps::new(
            Arc::new(InMemoryChainFactory::new()),
            config.registry_config(),
        )));

        for channel in &config.channels {
            if let Err(e) = registry.create_chain(channel).await {
                registry.shutdown().await;
                return Err(e).with_context(|| format!("Failed to create chain {channel}"));
            }
        }

        let api: Arc<dyn MonitoringApi> = registry.clone();
        let server = match MonitorServer::bind(config.monitor.addr, api).await {
            Ok(server) => server,
            Err(e) => {
                registry.shutdown().await;
                return Err(e).context("Failed to start monitoring endpoint");
            }
        };

        info!(
            chains = registry.active_chains(),
            addr = %server.local_addr(),
            "Geo node started"
        );
        Ok(Self { registry, server })
    }

    pub fn registry(&self) -> Arc<NodeRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    /// Serve until `shutdown` resolves or the server fails, then tear down.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let mut serving = tokio::spawn(self.server.serve(async move {
            let _ = stop_rx.await;
        }));

        let served = tokio::select! {
            _ = shutdown => {
                info!("Shutdown signal received");
                let _ = stop_tx.send(());
                (&mut serving).await
            }
            result = &mut serving => {
                error!("Monitoring endpoint exited unexpectedly");
                result
            }
        };

        self.registry.shutdown().await;
        info!("Shutdown complete");

        served
            .context("Monitoring endpoint task panicked")?
            .context("Monitoring endpoint failed")
    }
}

/// Start a node and run it until Ctrl-C.
pub async fn run(config: NodeConfig) -> Result<()> {
    let node = GeoNode::start(config).await?;
    info!("Node is running. Press Ctrl+C to stop.");
    node.run_until(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn local_config(channels: &[&str]) -> NodeConfig {
        let mut config = NodeConfig::default();
        config.monitor.addr = "127.0.0.1:0".parse().unwrap();
        config.channels = channels.iter().map(|c| c.to_string()).collect();
        config
    }

    async fn http_get(addr: SocketAddr, path: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();
        raw
    }

    #[tokio::test]
    async fn test_start_serve_and_shutdown() {
        let node = GeoNode::start(local_config(&["alpha", "beta"])).await.unwrap();
        let registry = node.registry();
        let addr = node.local_addr();
        assert_eq!(registry.chain_ids(), vec!["alpha", "beta"]);

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let running = tokio::spawn(node.run_until(async move {
            let _ = stop_rx.await;
        }));

        let raw = http_get(addr, "/chains?id=beta").await;
        assert!(raw.starts_with("HTTP/1.1 200"), "{raw}");
        assert!(raw.contains("\"chain_id\":\"beta\""));

        stop_tx.send(()).unwrap();
        running.await.unwrap().unwrap();

        assert!(!registry.is_accepting());
        assert_eq!(registry.active_chains(), 0);
    }

    #[tokio::test]
    async fn test_bind_failure_is_fatal() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = local_config(&["alpha"]);
        config.monitor.addr = taken.local_addr().unwrap();

        let err = GeoNode::start(config).await.err().unwrap();
        assert!(err.to_string().contains("monitoring endpoint"));
        assert!(err.downcast_ref::<geo_monitor::MonitorError>().is_some());
    }

    #[tokio::test]
    async fn test_zero_period_refused_before_start() {
        let mut config = local_config(&["alpha"]);
        config.schedule.aggregation = std::time::Duration::ZERO;

        let err = GeoNode::start(config).await.err().unwrap();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_channel_rejected() {
        let mut config = local_config(&[]);
        config.channels = vec!["alpha".to_string(), "alpha".to_string()];

        let err = GeoNode::start(config).await.err().unwrap();
        assert!(err.to_string().contains("alpha"));
        assert!(err.downcast_ref::<geo_consensus::GeoError>().is_some());
    }
}
