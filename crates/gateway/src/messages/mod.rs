//! Wire message types for gateway communication
//!
//! JSON frames as pushed by a venue's trade channel.

pub mod market_data;

pub use market_data::{TradeMessage, decode_trades, encode_trade};
