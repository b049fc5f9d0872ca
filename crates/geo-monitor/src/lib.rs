//! # geo-monitor
//!
//! Read-only HTTP surface over [`geo_consensus::MonitoringApi`].
//!
//! | Route | Body |
//! |-------|------|
//! | `GET /health` | status, active chains, uptime |
//! | `GET /metrics` | registry counters and per-chain metrics |
//! | `GET /topology` | topology snapshot per chain |
//! | `GET /chains[?id=<chain>]` | metrics and topology, one chain or all |
//! | `GET /metrics/prometheus` | prometheus text format (`metrics` feature) |
//!
//! Unknown chains answer 404 and queries after registry shutdown answer 503,
//! both with `{"error": ..., "timestamp": ...}`.

mod error;
mod handlers;
mod router;
mod server;

pub use error::{ApiError, MonitorError};
pub use router::{build_router, AppState};
pub use server::MonitorServer;
