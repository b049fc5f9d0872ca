//! Geo node executable.

use anyhow::{Context, Result};
use geo_node::NodeConfig;
use geo_telemetry::{init_telemetry, TelemetryConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env().context("Failed to load node configuration")?;

    let _telemetry =
        init_telemetry(TelemetryConfig::from_env()).context("Failed to initialise telemetry")?;

    info!(
        channels = ?config.channels,
        monitor = %config.monitor.addr,
        "Starting geo node"
    );

    geo_node::run(config).await
}
