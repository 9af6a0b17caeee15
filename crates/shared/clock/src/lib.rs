//! coincross Clock Infrastructure
//!
//! Time sources for adapters that stamp their own records:
//!
//! - [`SystemClock`] reads the wall clock.
//! - [`ManualClock`] only moves when told to, for deterministic tests.
//!
//! ```ignore
//! use coincross_clock::{Clock, ManualClock};
//! use chrono::Duration;
//!
//! let clock = ManualClock::at_epoch_secs(1_700_000_000);
//! clock.advance(Duration::seconds(5));
//! assert_eq!(clock.now().timestamp(), 1_700_000_005);
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use coincross_ports::Clock;
