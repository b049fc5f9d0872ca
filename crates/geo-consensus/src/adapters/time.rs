//! Controllable clock for deterministic tests

use crate::ports::TimeSource;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

/// A time source that only moves when told to.
#[derive(Debug)]
pub struct FixedTimeSource {
    now: RwLock<DateTime<Utc>>,
}

impl FixedTimeSource {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write() = now;
    }

    pub fn advance(&self, by: Duration) {
        *self.now.write() += by;
    }
}

impl Default for FixedTimeSource {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}
