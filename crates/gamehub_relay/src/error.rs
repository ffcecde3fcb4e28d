//! # Relay Error Types

use gamehub_shared::ConfigError;
use thiserror::Error;

use crate::hub::ConnectionId;

/// Errors raised by the relay.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Socket failure.
    #[error("relay I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame could not be encoded or decoded.
    #[error("relay codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// An event arrived for a connection the hub does not know.
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;
