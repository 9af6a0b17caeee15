use coincross_core::CodecError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors surfaced by the client contract and the trade feed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Malformed pair or side text; the caller must fix the input
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Credentials rejected; fatal, never retried
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Insufficient funds: {required} {currency} required, {available} available")]
    InsufficientFunds {
        currency: String,
        required: Decimal,
        available: Decimal,
    },

    /// Non-positive price or amount
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    /// Out-of-range argument such as a zero limit or depth
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Referenced order or resource is unknown to the exchange
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network or protocol failure; retryable for reads and feeds
    #[error("Transport error: {0}")]
    Transport(String),

    /// Feed buffer exceeded; the subscription is over
    #[error("Feed overflow: buffer of {capacity} trades is full")]
    Overflow { capacity: usize },

    /// Trades after the cursor were evicted before they were read;
    /// resuming would skip them, so the feed ends instead
    #[error("History gap: trades after {since} up to {evicted} are no longer retained")]
    HistoryGap { since: i64, evicted: i64 },

    /// Feed consumer went away or the feed was cancelled
    #[error("Feed closed")]
    Closed,
}

impl ClientError {
    /// Short name of the error kind, for user-facing messages
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Codec(CodecError::Format(_)) => "FormatError",
            ClientError::Codec(CodecError::UnknownSide(_)) => "UnknownSideError",
            ClientError::Auth(_) => "AuthError",
            ClientError::InsufficientFunds { .. } => "InsufficientFundsError",
            ClientError::InvalidPrice(_) => "InvalidPriceError",
            ClientError::InvalidArgument(_) => "InvalidArgumentError",
            ClientError::NotFound(_) => "NotFoundError",
            ClientError::Transport(_) => "TransportError",
            ClientError::Overflow { .. } => "OverflowError",
            ClientError::HistoryGap { .. } => "HistoryGapError",
            ClientError::Closed => "ClosedError",
        }
    }

    /// Only transport failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
