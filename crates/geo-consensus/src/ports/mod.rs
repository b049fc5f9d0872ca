//! Ports layer (Hexagonal Architecture)
//!
//! Inbound ports are what the monitoring surface drives; outbound ports are
//! what the geo layer needs from the consensus protocol and the environment.

mod inbound;
mod outbound;

pub use inbound::*;
pub use outbound::*;
