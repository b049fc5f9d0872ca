//! Domain layer: locations, proximity, leader scoring and metric records
//!
//! Everything here is synchronous and free of locks; the service layer owns
//! synchronisation and scheduling.

mod config;
mod error;
mod leader;
mod location;
mod metrics;
mod proximity;
mod snapshot;
mod throughput;
mod topology;

pub use config::*;
pub use error::*;
pub use leader::*;
pub use location::*;
pub use metrics::*;
pub use proximity::*;
pub use snapshot::*;
pub use throughput::*;
pub use topology::*;
