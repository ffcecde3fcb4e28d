//! # GameHub Session
//!
//! The synchronization layer between one display and N controllers.
//!
//! ## Architecture
//!
//! ```text
//!  CONTROLLER                    STORE                      DISPLAY
//!      |                           |                           |
//!      |-- SessionClient::join --->|                           |
//!      |-- send(RacingTap) ------->| log: [.., i42]            |
//!      |                           |-- notice --------------->|
//!      |                           |<-- snapshot read ---------| Subscription::pump
//!      |                           |                           |-- listener(i42), once
//! ```
//!
//! - **Directory**: participants and the append-only log per session
//! - **Channel**: ordered, exactly-once delivery per listener (seen-set)
//! - **Client**: explicit session object, leaves on drop
//! - **Store**: injected seam; [`InMemoryStore`] for tests and demos

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod channel;
pub mod client;
pub mod directory;
pub mod error;
pub mod store;

pub use channel::{DeliveryStats, InteractionChannel, InteractionListener, Subscription};
pub use client::{InteractionSink, SessionClient};
pub use directory::{Membership, SessionDirectory};
pub use error::{SessionError, SessionResult};
pub use store::{InMemoryStore, InteractionDraft, SessionStore, StoreNotice};
