//! coincross Gateway
//!
//! Plumbing shared by exchange adapters. Provides:
//! - Push transport abstraction (tokio channels in-process, trait for others)
//! - Wire trade frames (JSON)
//! - Retry for idempotent reads
//! - The polling and push drivers behind `Client::stream`
//!
//! ## Architecture
//!
//! ```text
//!  Venue (simulator, remote API)
//!     │ trades.{pair} frames      │ history(pair, cursor)
//!  ┌──▼──────────┐          ┌─────▼───────┐
//!  │ TradeSource │          │   Client    │
//!  └──┬──────────┘          └─────┬───────┘
//!     └────────► PushStream / PollingStream
//!                      │ deliver (watermark)
//!                 ┌────▼─────┐
//!                 │ TradeFeed│  consumer
//!                 └──────────┘
//! ```

pub mod config;
pub mod error;
pub mod messages;
pub mod retry;
pub mod stream;
pub mod transport;

// Re-export commonly used types
pub use config::{
    GatewayConfig, StreamConfig, load_config, load_config_from_str, load_default_config,
};
pub use error::{ConfigError, TransportError};
pub use messages::{TradeMessage, decode_trades, encode_trade};
pub use retry::{RetryConfig, retry_read};
pub use stream::{Backoff, PollingStream, PushStream, spawn_stream};
pub use transport::{
    Subjects, TradeSource,
    channel::{ChannelTradeSource, ChannelTransport, Frame},
};
