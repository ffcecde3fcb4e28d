//! # Hub Error Types

use gamehub_games::GameError;
use gamehub_session::SessionError;
use gamehub_shared::ConfigError;
use thiserror::Error;

/// Errors raised by the display host and controller pad.
#[derive(Error, Debug)]
pub enum HubError {
    /// Joining, subscribing or publishing failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A game could not be set up.
    #[error(transparent)]
    Game(#[from] GameError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The URL carries no session id.
    #[error("not a controller join URL: {0}")]
    InvalidJoinUrl(String),
}

/// Result type for hub operations.
pub type HubResult<T> = Result<T, HubError>;
