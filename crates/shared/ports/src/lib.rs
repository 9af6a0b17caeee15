//! coincross Ports
//!
//! Port definitions (traits) for the coincross client abstraction.
//! These define the boundary every exchange adapter must satisfy.

mod client;
mod clock;
mod error;
pub mod feed;

pub use client::{Balances, Client, Cursor};
pub use clock::Clock;
pub use error::{ClientError, ClientResult};
pub use feed::{FeedConfig, FeedItem, FeedSender, OverflowPolicy, TradeFeed, trade_feed};
