//! coincross Core Domain
//!
//! Pure domain types shared by every exchange adapter: currency pairs and
//! their two notations, trade sides, and the records returned by the client
//! contract (orders, trades, ledger transactions, order books, tickers).
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod error;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    BookLevel, Order, Orderbook, Pair, Symbol, Ticker, Trade, TradeType, Transaction,
};
pub use error::{CodecError, CodecResult};
pub use values::{OrderId, Price, Quantity, Timestamp, TradeId, TransactionId};
