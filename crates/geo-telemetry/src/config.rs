//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and span export.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryConfig {
    /// Service name for traces and logs
    pub service_name: String,

    /// OTLP collector endpoint; span export is off when unset
    pub otlp_endpoint: Option<String>,

    /// Filter directive (trace, debug, info, warn, error, or a full
    /// `EnvFilter` expression)
    pub log_level: String,

    /// Whether to write log lines to stdout
    pub console_output: bool,

    /// Whether log lines are JSON instead of human-readable text
    pub json_logs: bool,

    /// Deployment identifier (testnet, mainnet, devnet)
    pub network: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "geo-consensus".to_string(),
            otlp_endpoint: None,
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            network: "devnet".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OTEL_SERVICE_NAME`: Service name (default: geo-consensus)
    /// - `OTEL_EXPORTER_OTLP_ENDPOINT`: Collector endpoint (default: unset)
    /// - `GEO_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `GEO_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `GEO_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    /// - `GEO_NETWORK`: Network name (default: devnet)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`TelemetryConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        Self {
            service_name: lookup("OTEL_SERVICE_NAME").unwrap_or(defaults.service_name),

            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.is_empty()),

            log_level: lookup("GEO_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            console_output: lookup("GEO_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.console_output),

            json_logs: lookup("GEO_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            network: lookup("GEO_NETWORK").unwrap_or(defaults.network),
        }
    }
}
