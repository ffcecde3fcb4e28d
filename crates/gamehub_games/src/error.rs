//! # Game Error Types
//!
//! Errors raised at the state-machine and encoder boundaries.

use gamehub_session::SessionError;
use thiserror::Error;

/// Errors that can occur in the games layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Input outside the accepted domain (card position, lane index, board layout).
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// What was wrong with it.
        reason: String,
    },

    /// The game already reached a terminal state.
    #[error("game already finished")]
    Finished,

    /// The join/send path failed.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl GameError {
    /// Shorthand for a [`GameError::InvalidInput`].
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

/// Result type for game operations.
pub type GameResult<T> = Result<T, GameError>;
