use coincross_core::Timestamp;

/// Port for time abstraction
///
/// Adapters stamp orders, trades and ledger entries through this, so tests
/// can drive time by hand instead of reading the wall clock.
pub trait Clock: Send + Sync {
    /// Get the current time according to this clock
    fn now(&self) -> Timestamp;

    /// Get the clock's name/identifier for debugging
    fn name(&self) -> &str {
        "Clock"
    }
}
