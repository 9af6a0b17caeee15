//! Error types for the gateway crate

use coincross_core::CodecError;
use coincross_ports::ClientError;
use thiserror::Error;

/// Push transport and wire decoding errors
///
/// All of these are transient from the feed's point of view: the driver
/// closes the source, backs off and resubscribes.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Disconnected by remote")]
    Disconnected,

    #[error("Undecodable frame: {0}")]
    Decode(String),

    #[error("Subscriber lagged, {0} frames lost")]
    Lagged(u64),

    #[error("Channel closed")]
    ChannelClosed,
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        TransportError::Decode(e.to_string())
    }
}

impl From<CodecError> for TransportError {
    fn from(e: CodecError) -> Self {
        TransportError::Decode(e.to_string())
    }
}

impl From<TransportError> for ClientError {
    fn from(e: TransportError) -> Self {
        ClientError::Transport(e.to_string())
    }
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
