use midas_core::{EpochSeconds, Timestamp};

/// Port for time abstraction
///
/// This allows the system to use different time sources:
/// - Real system time for production
/// - Manually-controlled time for deterministic tests
pub trait Clock: Send + Sync {
    /// Get the current time according to this clock
    fn now(&self) -> Timestamp;

    /// Current time as seconds since the Unix epoch
    fn epoch(&self) -> EpochSeconds {
        self.now().timestamp()
    }

    /// Get the clock's name/identifier for debugging
    fn name(&self) -> &str {
        "Clock"
    }
}
