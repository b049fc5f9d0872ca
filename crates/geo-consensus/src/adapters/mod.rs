//! Adapters layer (Hexagonal Architecture)
//!
//! In-memory and simulated implementations of the outbound ports.

mod chain;
mod latency;
mod time;

pub use chain::*;
pub use latency::*;
pub use time::*;
