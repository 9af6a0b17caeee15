use coincross_core::Timestamp;
use coincross_core::values::from_epoch_secs;
use coincross_ports::Clock;
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Clock frozen at a fixed instant until advanced by hand
///
/// Resolution is one second, the same as exchange records on the wire.
pub struct ManualClock {
    secs: AtomicI64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            secs: AtomicI64::new(start.timestamp()),
        }
    }

    pub fn at_epoch_secs(secs: i64) -> Self {
        Self {
            secs: AtomicI64::new(secs),
        }
    }

    /// Move time forward (or backward, with a negative duration)
    pub fn advance(&self, by: Duration) {
        self.secs.fetch_add(by.num_seconds(), Ordering::SeqCst);
    }

    /// Jump to an absolute instant
    pub fn set(&self, time: Timestamp) {
        self.secs.store(time.timestamp(), Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        from_epoch_secs(self.secs.load(Ordering::SeqCst))
    }

    fn name(&self) -> &str {
        "ManualClock"
    }
}
