//! # GameHub Relay
//!
//! The alternate room transport: a display and its controllers connect to
//! one process, join a room by session id, and everything one member emits
//! is fanned out to every member of that room.
//!
//! ## Wire format
//!
//! One JSON object per line, `{"event": "<name>", "data": {...}}`.
//!
//! | Client event     | Effect                                              |
//! |------------------|-----------------------------------------------------|
//! | `join-session`   | `player-joined` to the room, `session-state` to you |
//! | `button-press`   | stored, then `interaction` to the room              |
//! | `game-action`    | `game-action` to the room, not stored               |
//! | (disconnect)     | `player-left` to the rest of the room               |
//!
//! Rooms live in memory only. Nothing is deduplicated here; consumers that
//! need exactly-once handling key on the interaction id.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod hub;
pub mod server;

pub use error::{RelayError, RelayResult};
pub use hub::{
    ClientEvent, ConnectionId, JoinRequest, PlayerJoined, PlayerLeft, RelayGameAction, RelayHub,
    RelayInteraction, ServerEvent, SessionState, BUTTON_PRESS,
};
pub use server::RelayServer;
