//! Exponential reconnect backoff

use std::time::Duration;

use crate::config::StreamConfig;

/// Delay schedule for reconnect attempts
///
/// Grows by `multiplier` per consecutive failure up to `max`, and resets
/// once a session is healthy again.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    multiplier: f64,
    max_attempts: Option<u32>,
    current: Duration,
    failures: u32,
}

impl Backoff {
    pub fn new(config: &StreamConfig) -> Self {
        let initial = Duration::from_millis(config.reconnect_initial_delay_ms);
        Self {
            initial,
            max: Duration::from_millis(config.reconnect_max_delay_ms),
            multiplier: config.reconnect_multiplier,
            max_attempts: config.max_reconnect_attempts,
            current: initial,
            failures: 0,
        }
    }

    /// Delay before the next attempt, or `None` once the ceiling is reached
    pub fn next_delay(&mut self) -> Option<Duration> {
        if let Some(limit) = self.max_attempts {
            if self.failures >= limit {
                return None;
            }
        }
        self.failures += 1;
        let delay = self.current;
        self.current = self.current.mul_f64(self.multiplier).min(self.max);
        Some(delay)
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
        self.failures = 0;
    }

    /// Consecutive failures since the last reset
    pub fn failures(&self) -> u32 {
        self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_attempts: Option<u32>) -> StreamConfig {
        StreamConfig {
            reconnect_initial_delay_ms: 100,
            reconnect_max_delay_ms: 350,
            reconnect_multiplier: 2.0,
            max_reconnect_attempts: max_attempts,
            ..StreamConfig::default()
        }
    }

    #[test]
    fn test_delays_grow_and_cap() {
        let mut backoff = Backoff::new(&config(None));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(100)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(200)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(350)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(350)));
        assert_eq!(backoff.failures(), 4);
    }

    #[test]
    fn test_ceiling_and_reset() {
        let mut backoff = Backoff::new(&config(Some(2)));
        assert!(backoff.next_delay().is_some());
        assert!(backoff.next_delay().is_some());
        assert_eq!(backoff.next_delay(), None);

        backoff.reset();
        assert_eq!(backoff.failures(), 0);
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(100)));
    }
}
