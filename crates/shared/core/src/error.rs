use thiserror::Error;

/// Errors raised while decoding pair or trade-side text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Malformed pair or symbol text. Never retried, the input must change.
    #[error("Format error: {0}")]
    Format(String),

    /// Trade-side token outside of buy/bid/sell/ask
    #[error("Unknown trade side: {0}")]
    UnknownSide(String),
}

pub type CodecResult<T> = std::result::Result<T, CodecError>;
