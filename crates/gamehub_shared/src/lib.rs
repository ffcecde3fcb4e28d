//! # GameHub Shared
//!
//! Common types used by the display, the controllers and the relay.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - a store or transport implementation
//! - any game state machine
//!
//! If a type needs a live session, put it in `gamehub_session`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod action;
pub mod clock;
pub mod config;
pub mod constants;
pub mod ids;
pub mod protocol;

pub use action::Action;
pub use clock::now_millis;
pub use config::{ConfigError, ConfigResult, HubConfig};
pub use constants::{LANE_COUNT, MEMORY_BOARD_SIZE, MEMORY_PAIRS, RELAY_BIND};
pub use ids::{InteractionId, ParticipantId, SessionId};
pub use protocol::{join_url, parse_join_url, DeviceRole, InteractionRecord, ParticipantRecord};
