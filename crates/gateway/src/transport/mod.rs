//! Transport abstraction layer
//!
//! A push transport hands raw frames for one pair to a stream driver.
//! `channel` is the in-process implementation; a websocket transport would
//! implement the same trait.

pub mod channel;
pub mod subjects;

pub use subjects::Subjects;

use crate::error::TransportError;
use async_trait::async_trait;
use coincross_core::Pair;

/// Source of live trade frames for a single pair
#[async_trait]
pub trait TradeSource: Send {
    /// Subscribe to the pair's trade channel, replacing any previous subscription
    async fn connect(&mut self, pair: &Pair) -> Result<(), TransportError>;

    /// Wait for the next raw frame
    async fn next_frame(&mut self) -> Result<String, TransportError>;

    /// Release the subscription; a later `connect` starts over
    async fn close(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Ensure traits are object-safe
    fn _assert_source_object_safe(_: &mut dyn TradeSource) {}
}
