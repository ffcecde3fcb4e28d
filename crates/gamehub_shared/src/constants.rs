//! # Hub Constants
//!
//! Defaults shared by the configuration layer, the games and the relay.
//!
//! **NOTE:** Controllers and displays built from different revisions must
//! agree on the board and lane constants below.

// =============================================================================
// SESSION
// =============================================================================

/// Default origin used to build controller join URLs.
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Path segment that precedes the session id in a join URL.
pub const CONTROLLER_PATH: &str = "controller";

/// Prefix of display-generated session ids.
pub const DISPLAY_SESSION_PREFIX: &str = "memory-game-";

/// Display name the main display joins with.
pub const DISPLAY_NAME: &str = "MainDisplay";

/// Player name used when no interaction has named one yet.
pub const DEFAULT_PLAYER_NAME: &str = "Player";

/// Capacity of a store watch channel.
pub const CHANNEL_CAPACITY: usize = 1024;

// =============================================================================
// MEMORY
// =============================================================================

/// Number of cells on the memory board.
pub const MEMORY_BOARD_SIZE: usize = 18;

/// Number of distinct symbols (and therefore pairs) on the board.
pub const MEMORY_PAIRS: usize = 9;

/// Delay before a matching pair locks in (ms).
pub const MATCH_DELAY_MS: u64 = 500;

/// Delay before a mismatching pair flips back (ms).
pub const MISMATCH_DELAY_MS: u64 = 1000;

// =============================================================================
// PLATFORMER & RACER
// =============================================================================

/// Platformer simulation rate (ticks per second).
pub const PLATFORMER_TICK_RATE: u32 = 60;

/// Racer collision/finish check interval (ms).
pub const RACER_TICK_INTERVAL_MS: u64 = 16;

/// Number of racer lanes.
pub const LANE_COUNT: u8 = 3;

// =============================================================================
// ENCODERS
// =============================================================================

/// Minimum gap between two jump emissions (ms).
pub const ENCODER_MIN_GAP_MS: u64 = 50;

/// Window after an emission during which re-entry is suppressed (ms).
pub const ENCODER_ACK_WINDOW_MS: u64 = 100;

// =============================================================================
// RELAY
// =============================================================================

/// Relay bind address (accepts connections from all interfaces).
pub const RELAY_BIND: &str = "0.0.0.0:3001";

/// Interactions included in a `session-state` reply.
pub const RELAY_RECENT_INTERACTIONS: usize = 10;
