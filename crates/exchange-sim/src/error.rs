use coincross_core::{OrderId, Pair, TradeId};
use coincross_ports::ClientError;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("Unknown pair: {0}")]
    UnknownPair(Pair),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Insufficient {currency}: required {required}, available {available}")]
    InsufficientFunds {
        currency: String,
        required: Decimal,
        available: Decimal,
    },

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("Trades of {pair} after {since} up to {evicted} are no longer retained")]
    HistoryGap {
        pair: Pair,
        since: TradeId,
        evicted: TradeId,
    },

    /// Injected outage
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ExchangeError>;

impl From<ExchangeError> for ClientError {
    fn from(err: ExchangeError) -> Self {
        match err {
            ExchangeError::UnknownPair(pair) => {
                ClientError::InvalidArgument(format!("unknown pair {}", pair))
            }
            ExchangeError::Auth(msg) => ClientError::Auth(msg),
            ExchangeError::InsufficientFunds {
                currency,
                required,
                available,
            } => ClientError::InsufficientFunds {
                currency,
                required,
                available,
            },
            ExchangeError::InvalidPrice(msg) => ClientError::InvalidPrice(msg),
            ExchangeError::InvalidArgument(msg) | ExchangeError::Config(msg) => {
                ClientError::InvalidArgument(msg)
            }
            ExchangeError::OrderNotFound(id) => ClientError::NotFound(format!("order {}", id)),
            ExchangeError::HistoryGap { since, evicted, .. } => {
                ClientError::HistoryGap { since, evicted }
            }
            ExchangeError::Unavailable(msg) => ClientError::Transport(msg),
        }
    }
}
