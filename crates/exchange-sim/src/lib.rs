//! In-memory exchange for coincross
//!
//! [`Exchange`] is a small venue: accounts with locked balances, per-pair
//! limit books matched by price-time priority, a ledger, a retained trade
//! log, and a push channel of trade frames. It can inject outages,
//! disconnects and revoked keys. [`SimClient`] exposes it through the
//! `Client` contract.

pub mod account;
pub mod book;
pub mod client;
pub mod config;
pub mod error;
pub mod exchange;

// Re-export main types for convenience
pub use client::SimClient;
pub use config::{SimConfig, StreamMode};
pub use error::{ExchangeError, Result};
pub use exchange::{Credentials, Exchange};
