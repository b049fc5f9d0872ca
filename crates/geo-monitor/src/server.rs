//! TCP listener and serve loop

use crate::error::MonitorError;
use crate::router::build_router;
use axum::Router;
use geo_consensus::MonitoringApi;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// A bound, not yet serving, monitoring endpoint.
pub struct MonitorServer {
    listener: TcpListener,
    router: Router,
    local_addr: SocketAddr,
}

impl MonitorServer {
    /// Bind `addr`. Failure is fatal and is not retried.
    pub async fn bind(addr: SocketAddr, api: Arc<dyn MonitoringApi>) -> Result<Self, MonitorError> {
        let listener = TcpListener::bind(addr).await.map_err(|source| {
            error!(addr = %addr, error = %source, "Failed to bind monitoring endpoint");
            MonitorError::Bind { addr, source }
        })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| MonitorError::Bind { addr, source })?;

        Ok(Self {
            listener,
            router: build_router(api),
            local_addr,
        })
    }

    /// The bound address; differs from the requested one for port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until `shutdown` resolves, then drain open connections.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), MonitorError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(addr = %self.local_addr, "Monitoring endpoint listening");
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(MonitorError::Serve)?;
        info!(addr = %self.local_addr, "Monitoring endpoint stopped");
        Ok(())
    }
}
