//! # Session Error Types
//!
//! All errors that can occur on the join/send/subscribe path.

use thiserror::Error;

/// Errors that can occur in the session layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The underlying store or transport is unreachable.
    #[error("session store unreachable: {reason}")]
    Connection {
        /// What the store reported.
        reason: String,
    },

    /// An append or subscribe was attempted before a join succeeded.
    #[error("not joined to a session, `{action}` dropped")]
    NotJoined {
        /// Kind of the action that was dropped.
        action: String,
    },

    /// The subscription was already torn down.
    #[error("subscription closed")]
    ChannelClosed,
}

impl SessionError {
    /// Shorthand for a [`SessionError::Connection`].
    #[must_use]
    pub fn connection(reason: impl Into<String>) -> Self {
        Self::Connection {
            reason: reason.into(),
        }
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
