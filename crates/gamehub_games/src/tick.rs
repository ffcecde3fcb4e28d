//! # Game Tick Loop
//!
//! Fixed-timestep scheduler owned by the display host.
//!
//! ## Design
//!
//! Games never schedule themselves. The host feeds wall-clock (or simulated)
//! time into [`TickLoop::advance`] and runs one game step per returned tick:
//!
//! ```text
//! elapsed ──> accumulator ──> N whole steps ──> game.step() x N
//!                  └── remainder carried to the next call
//! ```
//!
//! Stopping a game is dropping or resetting its loop; no step can fire after.

use std::time::Duration;

/// Fixed-timestep tick loop controller.
pub struct TickLoop {
    /// Target tick duration.
    tick_duration: Duration,
    /// Time not yet consumed by a tick.
    accumulator: Duration,
    /// Total ticks executed.
    tick_count: u64,
}

impl TickLoop {
    /// Creates a tick loop running `tick_rate` steps per second.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        Self::with_interval(Duration::from_micros(1_000_000 / u64::from(tick_rate.max(1))))
    }

    /// Creates a tick loop with an explicit step interval.
    #[must_use]
    pub fn with_interval(tick_duration: Duration) -> Self {
        Self {
            tick_duration: tick_duration.max(Duration::from_micros(1)),
            accumulator: Duration::ZERO,
            tick_count: 0,
        }
    }

    /// Adds `elapsed` game time and returns how many whole steps are now due.
    ///
    /// The due steps are counted as executed; the remainder carries over.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulator += elapsed;
        let mut due = 0u32;
        while self.accumulator >= self.tick_duration {
            self.accumulator -= self.tick_duration;
            self.tick_count += 1;
            due = due.saturating_add(1);
        }
        due
    }

    /// Drops pending time and zeroes the counter.
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
        self.tick_count = 0;
    }

    /// Returns the number of steps executed.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Returns the step interval.
    #[must_use]
    pub const fn tick_duration(&self) -> Duration {
        self.tick_duration
    }
}

impl Default for TickLoop {
    fn default() -> Self {
        Self::new(gamehub_shared::constants::PLATFORMER_TICK_RATE)
    }
}
