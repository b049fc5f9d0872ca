//! Latency probe synthesised from geographic distance
//!
//! Stand-in for a real measurement source: `distance * 0.1 ms/km`, truncated
//! to whole milliseconds, halved within a region, plus uniform jitter.

use crate::domain::{GeoLocation, ProximityEngine};
use crate::ports::LatencyProbe;
use rand::Rng;
use std::time::Duration;

pub const DEFAULT_MS_PER_KM: f64 = 0.1;
pub const DEFAULT_JITTER_MS: u64 = 20;

#[derive(Debug, Clone)]
pub struct SimulatedLatencyProbe {
    ms_per_km: f64,
    /// Jitter is drawn from `[0, jitter_max_ms)`
    jitter_max_ms: u64,
}

impl SimulatedLatencyProbe {
    pub fn new(ms_per_km: f64, jitter_max_ms: u64) -> Self {
        Self {
            ms_per_km: ms_per_km.max(0.0),
            jitter_max_ms,
        }
    }

    /// Deterministic probe for tests.
    pub fn without_jitter() -> Self {
        Self::new(DEFAULT_MS_PER_KM, 0)
    }

    /// Distance component before jitter.
    pub fn base_latency(&self, from: &GeoLocation, to: &GeoLocation) -> Duration {
        let km = ProximityEngine::distance(from, to);
        let base = Duration::from_millis((km * self.ms_per_km) as u64);
        if from.same_region(to) {
            base / 2
        } else {
            base
        }
    }
}

impl Default for SimulatedLatencyProbe {
    fn default() -> Self {
        Self::new(DEFAULT_MS_PER_KM, DEFAULT_JITTER_MS)
    }
}

impl LatencyProbe for SimulatedLatencyProbe {
    fn measure(&self, from: &GeoLocation, to: &GeoLocation) -> Duration {
        let jitter = if self.jitter_max_ms > 0 {
            rand::thread_rng().gen_range(0..self.jitter_max_ms)
        } else {
            0
        };
        self.base_latency(from, to) + Duration::from_millis(jitter)
    }
}
