//! # Charge-Jump Platformer
//!
//! One actor climbs an endless column of drifting platforms. A jump press
//! starts charging; the next press releases a jump whose strength depends on
//! the charge at that moment.
//!
//! ## Coordinates
//!
//! ```text
//!  y=0 ┌──────────── 800 ────────────┐
//!      │   ════      platforms drift │  each platform 120 x 25,
//!      │        ════   and wrap      │  one every 120 px upward
//!      │             ▇ actor 40x40   │
//! 520  ├─────────────────────────────┤  ground
//! 600  └─────────────────────────────┘
//! ```
//!
//! Y grows downward. One [`PlatformerGame::step`] is one physics frame; the
//! host runs it from a [`crate::TickLoop`].

use std::time::Duration;

use rand::Rng;

use crate::memory::round_secs;

/// Downward acceleration per step.
pub const GRAVITY: f32 = 0.5;
/// Play-field width.
pub const FIELD_WIDTH: f32 = 800.0;
/// Play-field height.
pub const FIELD_HEIGHT: f32 = 600.0;
/// Height of the ground strip.
pub const GROUND_HEIGHT: f32 = 80.0;
/// Y of the ground surface.
pub const GROUND_Y: f32 = FIELD_HEIGHT - GROUND_HEIGHT;
/// Platform width.
pub const PLATFORM_WIDTH: f32 = 120.0;
/// Platform height.
pub const PLATFORM_HEIGHT: f32 = 25.0;
/// Vertical gap between platforms.
pub const PLATFORM_SPACING: f32 = 120.0;
/// Platforms generated above the ground.
pub const PLATFORM_COUNT: u32 = 49;
/// Actor side length.
pub const ACTOR_SIZE: f32 = 40.0;
/// Launch speed at zero charge.
pub const JUMP_POWER_MIN: f32 = 8.0;
/// Launch speed at full charge.
pub const JUMP_POWER_MAX: f32 = 20.0;
/// Charge steps from empty to full (charge moves 0.01 per step).
pub const CHARGE_STEPS: i32 = 100;
/// Extra depth below a platform top that still counts as landing on it.
pub const LANDING_TOLERANCE: f32 = 10.0;
/// Slack above the ground that still allows starting a charge.
pub const GROUND_SLACK: f32 = 5.0;
/// Fall distance below the best height that ends the game, as a share of the field height.
pub const FALL_LIMIT: f32 = 0.7;

/// A drifting platform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Platform {
    /// Stable id, referenced by [`Actor::platform`].
    pub id: u32,
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
    /// Horizontal drift per step.
    pub velocity: f32,
}

/// The player's body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Actor {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
    /// Vertical speed; negative is up.
    pub velocity_y: f32,
    /// Airborne after a launch, until it lands.
    pub is_jumping: bool,
    /// Id of the platform carrying the actor.
    pub platform: Option<u32>,
}

impl Actor {
    #[inline]
    fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// High-level phase of the actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActorPhase {
    /// Standing on the ground or a platform.
    Grounded,
    /// Standing and charging a jump.
    Charging,
    /// In the air.
    Airborne,
}

/// What a jump press did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum JumpOutcome {
    /// Charging began.
    ChargeStarted,
    /// The jump left with this launch speed.
    Launched {
        /// Upward speed, between the min and max jump power.
        power: f32,
    },
    /// Press had no effect (airborne or finished).
    Ignored,
}

/// Final result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlatformerResult {
    /// Best height reached.
    pub max_height: u32,
    /// Play time.
    pub elapsed: Duration,
}

impl PlatformerResult {
    /// Play time rounded to whole seconds.
    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        round_secs(self.elapsed)
    }
}

/// Platformer state machine.
pub struct PlatformerGame {
    /// Platforms, lowest first.
    platforms: Vec<Platform>,
    /// The actor.
    actor: Actor,
    /// Charging a jump.
    charging: bool,
    /// Charge in steps, `0..=CHARGE_STEPS`.
    charge_steps: i32,
    /// +1 while filling, -1 while draining.
    charge_direction: i32,
    /// Current height.
    height: u32,
    /// Best height so far.
    max_height: u32,
    /// Duration of one step.
    step_duration: Duration,
    /// Game time since start.
    elapsed: Duration,
    /// Set when the actor fell too far.
    result: Option<PlatformerResult>,
}

impl PlatformerGame {
    /// Builds a game with a random platform column.
    pub fn new<R: Rng + ?Sized>(tick_rate: u32, rng: &mut R) -> Self {
        let platforms = (1..=PLATFORM_COUNT)
            .map(|i| Platform {
                id: i,
                x: rng.gen::<f32>() * (FIELD_WIDTH - PLATFORM_WIDTH),
                y: GROUND_Y - i as f32 * PLATFORM_SPACING,
                width: PLATFORM_WIDTH,
                height: PLATFORM_HEIGHT,
                velocity: (rng.gen::<f32>() - 0.5) * 2.0,
            })
            .collect();
        Self::with_platforms(tick_rate, platforms)
    }

    /// Builds a game over a fixed platform set.
    #[must_use]
    pub fn with_platforms(tick_rate: u32, platforms: Vec<Platform>) -> Self {
        let actor = Actor {
            x: FIELD_WIDTH / 2.0,
            y: GROUND_Y - ACTOR_SIZE,
            width: ACTOR_SIZE,
            height: ACTOR_SIZE,
            velocity_y: 0.0,
            is_jumping: false,
            platform: None,
        };
        let mut game = Self {
            platforms,
            actor,
            charging: false,
            charge_steps: 0,
            charge_direction: 1,
            height: 0,
            max_height: 0,
            step_duration: Duration::from_micros(1_000_000 / u64::from(tick_rate.max(1))),
            elapsed: Duration::ZERO,
            result: None,
        };
        game.update_height();
        tracing::info!("platformer started with {} platforms", game.platforms.len());
        game
    }

    /// Handles one jump press.
    pub fn jump(&mut self) -> JumpOutcome {
        if self.result.is_some() {
            return JumpOutcome::Ignored;
        }

        let supported =
            self.actor.platform.is_some() || self.actor.bottom() >= GROUND_Y - GROUND_SLACK;

        if !self.charging && !self.actor.is_jumping && supported {
            self.charging = true;
            self.charge_steps = 0;
            self.charge_direction = 1;
            tracing::debug!("charging jump");
            return JumpOutcome::ChargeStarted;
        }

        if !self.charging {
            return JumpOutcome::Ignored;
        }

        let power = JUMP_POWER_MIN + self.charge() * (JUMP_POWER_MAX - JUMP_POWER_MIN);
        self.charging = false;
        self.charge_steps = 0;
        self.charge_direction = 1;
        self.actor.velocity_y = -power;
        self.actor.is_jumping = true;
        self.actor.platform = None;
        tracing::debug!("jump launched with power {:.2}", power);
        JumpOutcome::Launched { power }
    }

    /// Runs one physics frame. Returns the result on the frame the game ends.
    pub fn step(&mut self) -> Option<PlatformerResult> {
        if self.result.is_some() {
            return None;
        }
        self.elapsed += self.step_duration;

        if self.charging {
            self.step_charge();
        }
        for platform in &mut self.platforms {
            step_platform(platform);
        }
        self.step_actor();
        self.update_height();

        let highest_y = GROUND_Y - self.max_height as f32 * 10.0;
        if self.actor.y > highest_y + FIELD_HEIGHT * FALL_LIMIT {
            let result = PlatformerResult {
                max_height: self.max_height,
                elapsed: self.elapsed,
            };
            tracing::info!(
                "platformer over: max height {}, {:.1}s",
                result.max_height,
                result.elapsed.as_secs_f32()
            );
            self.result = Some(result);
            return Some(result);
        }
        None
    }

    fn step_charge(&mut self) {
        let next = self.charge_steps + self.charge_direction;
        if next >= CHARGE_STEPS {
            self.charge_steps = CHARGE_STEPS;
            self.charge_direction = -1;
        } else if next <= 0 {
            self.charge_steps = 0;
            self.charge_direction = 1;
        } else {
            self.charge_steps = next;
        }
    }

    fn step_actor(&mut self) {
        let carrier = self
            .actor
            .platform
            .and_then(|id| self.platforms.iter().find(|p| p.id == id).copied());
        let actor = &mut self.actor;

        match carrier {
            Some(platform) => actor.x += platform.velocity,
            None => {
                actor.platform = None;
                actor.velocity_y += GRAVITY;
                actor.y += actor.velocity_y;
            }
        }

        if actor.x < -actor.width {
            actor.x = FIELD_WIDTH;
            actor.platform = None;
        } else if actor.x > FIELD_WIDTH {
            actor.x = -actor.width;
            actor.platform = None;
        }

        if let (Some(platform), Some(_)) = (carrier, actor.platform) {
            let center = actor.x + actor.width / 2.0;
            if center < platform.x || center > platform.x + platform.width {
                actor.platform = None;
            }
        }

        if actor.bottom() >= GROUND_Y && actor.velocity_y > 0.0 {
            actor.y = GROUND_Y - actor.height;
            actor.velocity_y = 0.0;
            actor.is_jumping = false;
            actor.platform = None;
        }

        if actor.velocity_y > 0.0 && actor.bottom() < GROUND_Y {
            let bottom = actor.bottom();
            let landing = self
                .platforms
                .iter()
                .filter(|p| {
                    actor.x < p.x + p.width
                        && actor.x + actor.width > p.x
                        && bottom > p.y
                        && bottom < p.y + p.height + LANDING_TOLERANCE
                })
                .min_by(|a, b| (bottom - a.y).total_cmp(&(bottom - b.y)));
            if let Some(platform) = landing {
                actor.y = platform.y - actor.height;
                actor.velocity_y = 0.0;
                actor.is_jumping = false;
                actor.platform = Some(platform.id);
            }
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn update_height(&mut self) {
        let height = ((GROUND_Y - self.actor.y) / 10.0).floor().max(0.0) as u32;
        self.height = height;
        self.max_height = self.max_height.max(height);
    }

    /// Current charge in `0.0..=1.0`.
    #[must_use]
    pub fn charge(&self) -> f32 {
        self.charge_steps as f32 / CHARGE_STEPS as f32
    }

    /// Whether a jump is charging.
    #[must_use]
    pub const fn is_charging(&self) -> bool {
        self.charging
    }

    /// High-level actor phase.
    #[must_use]
    pub fn phase(&self) -> ActorPhase {
        if self.charging {
            ActorPhase::Charging
        } else if self.actor.is_jumping || self.actor.velocity_y != 0.0 {
            ActorPhase::Airborne
        } else {
            ActorPhase::Grounded
        }
    }

    /// The actor.
    #[must_use]
    pub const fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Platforms, lowest first.
    #[must_use]
    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    /// Current height.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Best height so far.
    #[must_use]
    pub const fn max_height(&self) -> u32 {
        self.max_height
    }

    /// Top of the visible window once the actor has left the ground.
    #[must_use]
    pub fn camera_y(&self) -> f32 {
        if self.actor.y < FIELD_HEIGHT - 100.0 {
            self.actor.y - FIELD_HEIGHT * 0.6
        } else {
            0.0
        }
    }

    /// Game time since start.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Result once over.
    #[must_use]
    pub const fn result(&self) -> Option<PlatformerResult> {
        self.result
    }

    /// Whether the game ended.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.result.is_some()
    }

    #[cfg(test)]
    pub(crate) fn set_actor(&mut self, actor: Actor) {
        self.actor = actor;
    }
}

fn step_platform(platform: &mut Platform) {
    if platform.velocity == 0.0 {
        return;
    }
    let next = platform.x + platform.velocity;
    platform.x = if next < -platform.width {
        FIELD_WIDTH
    } else if next > FIELD_WIDTH {
        -platform.width
    } else {
        next
    };
}
