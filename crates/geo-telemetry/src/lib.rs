//! # Geo Telemetry
//!
//! Process-wide logging and tracing for geo-consensus binaries.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geo_telemetry::{init_telemetry, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).expect("Failed to init telemetry");
//!     // spans and events are now collected
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GEO_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `GEO_JSON_LOGS` | `false` | JSON log lines |
//! | `GEO_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `OTEL_SERVICE_NAME` | `geo-consensus` | Service name in logs and traces |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | unset | Span export target (`otlp` feature) |
//! | `GEO_NETWORK` | `devnet` | Deployment environment |

mod config;
mod logging;
#[cfg(feature = "otlp")]
mod tracing_setup;

pub use config::TelemetryConfig;
pub use logging::init_logging;
#[cfg(feature = "otlp")]
pub use tracing_setup::{init_tracing, TracingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize OpenTelemetry tracer: {0}")]
    TracerInit(String),

    #[error("Failed to install tracing subscriber: {0}")]
    Subscriber(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging, plus span export when built with `otlp` and an
/// endpoint is configured.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    #[cfg(feature = "otlp")]
    if let Some(endpoint) = config.otlp_endpoint.as_deref() {
        let tracing = tracing_setup::init_tracing(&config, endpoint)?;
        return Ok(TelemetryGuard {
            _tracing: Some(tracing),
        });
    }

    if config.otlp_endpoint.is_some() && !cfg!(feature = "otlp") {
        eprintln!("OTEL_EXPORTER_OTLP_ENDPOINT is set but span export is not compiled in");
    }

    init_logging(&config)?;
    Ok(TelemetryGuard {
        #[cfg(feature = "otlp")]
        _tracing: None,
    })
}

/// Guard that keeps telemetry active. Drop to flush and shutdown.
pub struct TelemetryGuard {
    #[cfg(feature = "otlp")]
    _tracing: Option<TracingGuard>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}
