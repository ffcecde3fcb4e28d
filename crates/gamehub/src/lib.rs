//! # GameHub
//!
//! Session lifecycle for the party game hub: the display that owns the game
//! and the controllers that feed it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐ encoders  ┌───────────────┐  pump   ┌────────────────────┐
//! │ ControllerPad xN │──────────>│ SessionStore  │────────>│ DisplayHost        │
//! │  matched cards   │<──────────│  (log)        │<────────│  one ActiveGame    │
//! └──────────────────┘  refresh  └───────────────┘ match-  │  StatsRecorder     │
//!                                                  update  └────────────────────┘
//! ```
//!
//! | Piece           | Joins as       | Owns                                   |
//! |-----------------|----------------|----------------------------------------|
//! | [`DisplayHost`] | `main-display` | the active game, its schedulers        |
//! | [`ControllerPad`] | `controller` | encoders, the matched-card reflection  |
//!
//! Both leave their session when dropped.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod controller;
pub mod display;
pub mod error;

pub use controller::ControllerPad;
pub use display::{ActiveGame, DisplayHost, PumpReport};
pub use error::{HubError, HubResult};

/// Re-export of the game layer.
pub use gamehub_games as games;
/// Re-export of the session layer.
pub use gamehub_session as session;
/// Re-export of the shared types.
pub use gamehub_shared as shared;
