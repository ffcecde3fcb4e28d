//! # GameHub Games - Display-Owned Mini-Games
//!
//! The three mini-games a party session can run, the encoders controllers
//! use to drive them, and the stats seam finished games report to.
//!
//! ## Architecture
//!
//! ```text
//! CONTROLLER                        DISPLAY
//!   |                                 |
//!   |-- encoder: gesture -> action -->| (session log)
//!   |                                 | <- active state machine applies it
//!   |<-- reflection (match-update) ---|
//!   |                                 | -> StatsRecorder on game end
//! ```
//!
//! State machines are plain values. They never sleep, spawn or schedule:
//! the host feeds them time through [`TickLoop`] or their `advance` method,
//! so tests can step them deterministically.
//!
//! | Game       | Input kinds                             | Clock                   |
//! |------------|-----------------------------------------|-------------------------|
//! | Memory     | `memory-card-select`                    | `advance(elapsed)`      |
//! | Platformer | `jump-action`                           | `step()` per 60Hz tick  |
//! | Racer      | `racing-tap`, `racing-lane-switch`      | `tick()` every 16ms     |

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod encoders;
pub mod error;
pub mod memory;
pub mod platformer;
pub mod racer;
pub mod stats;
pub mod tick;

pub use encoders::{EncodeOutcome, JumpEncoder, MemoryEncoder, RacerEncoder, Suppression};
pub use error::{GameError, GameResult};
pub use memory::{memory_score, CardState, MemoryEvent, MemoryGame, MemoryResult, Rejection, Selection};
pub use platformer::{ActorPhase, JumpOutcome, PlatformerGame, PlatformerResult};
pub use racer::{racer_score, RacerGame, RacerResult, TapOutcome};
pub use stats::{Achievement, GameKind, GameRecord, GameStatsBook, LeaderboardEntry, PlayerStats, StatsRecorder};
pub use tick::TickLoop;
