use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use midas_core::{EpochSeconds, Timestamp};
use midas_ports::Clock;

/// Manually-controlled clock for deterministic tests.
///
/// Time only moves when `advance` or `set` is called.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Start at an epoch-second instant
    pub fn at_epoch(epoch: EpochSeconds) -> Self {
        let start = DateTime::from_timestamp(epoch, 0).unwrap_or_else(Utc::now);
        Self::new(start)
    }

    pub fn set(&self, to: Timestamp) {
        *self.now.lock().unwrap() = to;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap()
    }

    fn name(&self) -> &str {
        "ManualClock"
    }
}
