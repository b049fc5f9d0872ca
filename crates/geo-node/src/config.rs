//! Node configuration
//!
//! Loaded from an optional TOML file named by `GEO_CONFIG`, then overridden
//! by `GEO_MONITOR_ADDR` and `GEO_CHANNELS` (comma separated).
//!
//! ```toml
//! channels = ["mychannel"]
//!
//! [monitor]
//! addr = "0.0.0.0:8080"
//!
//! [geo]
//! latency_threshold_ms = 150
//!
//! [schedule]
//! network_refresh_ms = 30000
//!
//! [[bootstrap]]
//! node_id = 1
//! latitude = 37.7749
//! longitude = -122.4194
//! region = "us-west"
//! zone = "us-west-1a"
//! datacenter = "sf-dc1"
//! ```

use geo_consensus::registry::default_bootstrap_nodes;
use geo_consensus::{BootstrapNode, GeoConfig, GeoError, RegistryConfig, TaskSchedule};
use serde::Deserialize;
use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Invalid node configuration: {0}")]
    Invalid(#[source] GeoError),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub addr: SocketAddr,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub monitor: MonitorConfig,
    pub geo: GeoConfig,
    pub schedule: TaskSchedule,
    pub bootstrap: Vec<BootstrapNode>,
    /// Channels to create at start-up
    pub channels: Vec<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            geo: GeoConfig::default(),
            schedule: TaskSchedule::default(),
            bootstrap: default_bootstrap_nodes(),
            channels: vec!["mychannel".to_string()],
        }
    }
}

impl NodeConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("GEO_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(addr) = lookup("GEO_MONITOR_ADDR") {
            config.monitor.addr = addr.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "GEO_MONITOR_ADDR",
                value: addr.clone(),
            })?;
        }
        if let Some(channels) = lookup("GEO_CHANNELS") {
            config.channels = parse_channels(&channels);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject schedules and bootstrap nodes the registry could not run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.registry_config()
            .validate()
            .map_err(ConfigError::Invalid)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            geo: self.geo.clone(),
            schedule: self.schedule.clone(),
            bootstrap: self.bootstrap.clone(),
        }
    }
}

fn parse_channels(raw: &str) -> Vec<String> {
    let mut channels: Vec<String> = Vec::new();
    for id in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !channels.iter().any(|c| c == id) {
            channels.push(id.to_string());
        }
    }
    channels
}
