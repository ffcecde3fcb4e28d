//! # Lane Racer
//!
//! Tap to run toward the finish line, switch lanes to dodge roadblocks.
//! Hitting one removes it and slows the runner for the next 5% of the track.
//!
//! ## Track model
//!
//! ```text
//!  world y (distance)                  screen (600 tall)
//!   1500 ── finish                    ┌─────────────────┐
//!     .                               │   ▒▒            │ obstacle band =
//!   obstacle.y                        │                 │   600 - (y - distance + 50)
//!     .                               │        ▇        │ runner band 470..550
//!   distance ── runner                └─────────────────┘
//! ```
//!
//! Taps move the runner forward and obstacles down. The host also calls
//! [`RacerGame::tick`] every 16ms for collision and finish checks.

use std::time::Duration;

use gamehub_shared::config::RacerSettings;
use gamehub_shared::LANE_COUNT;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::memory::round_secs;

/// Distance of the finish line.
pub const FINISH_DISTANCE: f32 = 1500.0;
/// Visible track height.
pub const TRACK_HEIGHT: f32 = 600.0;
/// Runner advance per tap.
pub const MOVE_DISTANCE: f32 = 12.5;
/// Obstacle approach per tap.
pub const OBSTACLE_STEP: f32 = 45.0;
/// Obstacle approach per tap while slowed.
pub const OBSTACLE_SLOW_STEP: f32 = 20.0;
/// Length of a slowed window, percent of the track.
pub const SLOW_PERCENT: f32 = 5.0;
/// Obstacle height on screen.
pub const OBSTACLE_HEIGHT: f32 = 120.0;
/// Top of the runner band on screen.
pub const RUNNER_TOP: f32 = TRACK_HEIGHT - 50.0 - 80.0;
/// Bottom of the runner band on screen.
pub const RUNNER_BOTTOM: f32 = TRACK_HEIGHT - 50.0;
/// Obstacles this far behind the runner are discarded.
pub const CLEANUP_BEHIND: f32 = 300.0;
/// Spawns avoid lanes holding an obstacle this close to the spawn line.
pub const SPAWN_CLEARANCE: f32 = 150.0;
/// Lane the runner starts in.
pub const START_LANE: u8 = 1;

const INITIAL_SETS: [f32; 3] = [300.0, 600.0, 900.0];

/// A roadblock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obstacle {
    /// Unique, never reused.
    pub id: u32,
    /// Lane `0..3`.
    pub lane: u8,
    /// World position.
    pub y: f32,
}

impl Obstacle {
    /// Whether this obstacle overlaps the runner band of a runner at `distance`.
    #[must_use]
    pub fn overlaps_runner(&self, distance: f32) -> bool {
        let top = TRACK_HEIGHT - (self.y - distance + 50.0);
        let bottom = top + OBSTACLE_HEIGHT;
        !(bottom < RUNNER_TOP || top > RUNNER_BOTTOM)
    }
}

/// What one tap did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TapOutcome {
    /// Progress after the tap, percent.
    pub progress: f32,
    /// Whether the tap moved at slowed speed.
    pub slowed: bool,
    /// Obstacles hit by this tap.
    pub hits: u32,
}

/// Final result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RacerResult {
    /// `max(100, 1000 - 10 * elapsed_secs)`.
    pub score: u32,
    /// Race time, whole seconds.
    pub elapsed_secs: u64,
    /// Obstacles hit.
    pub collisions: u32,
}

/// `max(100, 1000 - 10 * elapsed_secs)`.
#[must_use]
pub fn racer_score(elapsed_secs: u64) -> u32 {
    let penalty = u32::try_from(elapsed_secs.saturating_mul(10)).unwrap_or(u32::MAX);
    1000u32.saturating_sub(penalty).max(100)
}

/// Racer state machine.
pub struct RacerGame {
    /// Runner distance from the start.
    distance: f32,
    /// Runner lane.
    lane: u8,
    /// Live obstacles.
    obstacles: Vec<Obstacle>,
    /// Next obstacle id.
    next_obstacle_id: u32,
    /// Slowed while `distance` is below this.
    slowed_until: Option<f32>,
    /// Last 10% checkpoint that spawned.
    last_checkpoint: u32,
    /// Duration of one tick.
    tick_interval: Duration,
    /// Race time.
    elapsed: Duration,
    /// Obstacles hit.
    collisions: u32,
    /// Set at the finish.
    result: Option<RacerResult>,
    /// Spawn randomness.
    rng: ChaCha8Rng,
}

impl RacerGame {
    /// Creates a race. Seeds obstacle sets ahead of the start when configured.
    #[must_use]
    pub fn new(settings: &RacerSettings) -> Self {
        let seed = settings.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let mut game = Self {
            distance: 0.0,
            lane: START_LANE,
            obstacles: Vec::new(),
            next_obstacle_id: 0,
            slowed_until: None,
            last_checkpoint: 0,
            tick_interval: Duration::from_millis(settings.tick_interval_ms.max(1)),
            elapsed: Duration::ZERO,
            collisions: 0,
            result: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        if settings.seed_initial_obstacles {
            game.seed_initial_obstacles();
        }
        tracing::info!("racer started with {} obstacle(s)", game.obstacles.len());
        game
    }

    fn seed_initial_obstacles(&mut self) {
        for distance in INITIAL_SETS {
            let count = if self.rng.gen_bool(0.5) { 1 } else { 2 };
            let lanes = self.pick_lanes((0..LANE_COUNT).collect(), count);
            for (i, lane) in lanes.into_iter().enumerate() {
                self.push_obstacle(lane, distance + i as f32 * 100.0);
            }
        }
    }

    fn pick_lanes(&mut self, mut available: Vec<u8>, count: usize) -> Vec<u8> {
        let mut picked = Vec::with_capacity(count);
        while picked.len() < count && !available.is_empty() {
            let index = self.rng.gen_range(0..available.len());
            picked.push(available.remove(index));
        }
        picked
    }

    fn push_obstacle(&mut self, lane: u8, y: f32) {
        let id = self.next_obstacle_id;
        self.next_obstacle_id += 1;
        self.obstacles.push(Obstacle { id, lane, y });
    }

    /// Handles one `racing-tap`. Returns `None` once finished.
    pub fn tap(&mut self) -> Option<TapOutcome> {
        if self.result.is_some() {
            return None;
        }

        let slowed = self.is_slowed();
        let (step, obstacle_step) = if slowed {
            (MOVE_DISTANCE / 2.0, OBSTACLE_SLOW_STEP)
        } else {
            (MOVE_DISTANCE, OBSTACLE_STEP)
        };
        self.distance += step;
        for obstacle in &mut self.obstacles {
            obstacle.y -= obstacle_step;
        }

        let hits = self.check_collisions();
        self.update_checkpoint();

        Some(TapOutcome {
            progress: self.progress(),
            slowed,
            hits,
        })
    }

    /// Handles one `racing-lane-switch`. The lane is clamped to `0..=2`.
    pub fn switch_lane(&mut self, lane: i64) -> u8 {
        if self.result.is_none() {
            let clamped = lane.clamp(0, i64::from(LANE_COUNT) - 1);
            self.lane = u8::try_from(clamped).unwrap_or(START_LANE);
        }
        self.lane
    }

    /// Runs one fixed-interval check. Returns the result on the tick the race ends.
    pub fn tick(&mut self) -> Option<RacerResult> {
        if self.result.is_some() {
            return None;
        }
        self.elapsed += self.tick_interval;
        self.check_collisions();

        if self.progress() < 100.0 {
            return None;
        }
        let elapsed_secs = round_secs(self.elapsed);
        let result = RacerResult {
            score: racer_score(elapsed_secs),
            elapsed_secs,
            collisions: self.collisions,
        };
        tracing::info!(
            "race finished in {}s with {} collision(s), score {}",
            result.elapsed_secs,
            result.collisions,
            result.score
        );
        self.result = Some(result);
        Some(result)
    }

    fn check_collisions(&mut self) -> u32 {
        let lane = self.lane;
        let distance = self.distance;
        let before = self.obstacles.len();
        self.obstacles
            .retain(|o| !(o.lane == lane && o.overlaps_runner(distance)));
        let hits = u32::try_from(before - self.obstacles.len()).unwrap_or(u32::MAX);
        if hits > 0 {
            self.collisions += hits;
            self.slowed_until = Some(distance + FINISH_DISTANCE * SLOW_PERCENT / 100.0);
            tracing::debug!("hit {} obstacle(s) at {:.1}%, slowed", hits, self.progress());
        }
        hits
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn update_checkpoint(&mut self) {
        let floor = self.distance - CLEANUP_BEHIND;
        self.obstacles.retain(|o| o.y > floor);

        let percent = self.progress().floor().max(0.0) as u32;
        let checkpoint = percent / 10 * 10;
        if checkpoint > self.last_checkpoint && checkpoint < 100 {
            self.last_checkpoint = checkpoint;
            tracing::debug!("checkpoint {}%", checkpoint);
            self.spawn_at_checkpoint();
        }
    }

    fn spawn_at_checkpoint(&mut self) {
        let count = if self.rng.gen_bool(0.5) { 1 } else { 2 };
        let spawn_y = self.distance + TRACK_HEIGHT;
        let available: Vec<u8> = (0..LANE_COUNT)
            .filter(|&lane| {
                !self
                    .obstacles
                    .iter()
                    .any(|o| o.lane == lane && (o.y - spawn_y).abs() < SPAWN_CLEARANCE)
            })
            .collect();
        if available.is_empty() {
            return;
        }
        for (i, lane) in self.pick_lanes(available, count).into_iter().enumerate() {
            let jitter = self.rng.gen::<f32>() * SPAWN_CLEARANCE;
            self.push_obstacle(lane, spawn_y + i as f32 * 200.0 + jitter);
        }
    }

    /// Whether taps currently move at half speed.
    #[must_use]
    pub fn is_slowed(&self) -> bool {
        self.slowed_until.map_or(false, |until| self.distance < until)
    }

    /// Progress toward the finish, percent.
    #[must_use]
    pub fn progress(&self) -> f32 {
        self.distance / FINISH_DISTANCE * 100.0
    }

    /// Runner distance from the start.
    #[must_use]
    pub const fn distance(&self) -> f32 {
        self.distance
    }

    /// Runner lane.
    #[must_use]
    pub const fn lane(&self) -> u8 {
        self.lane
    }

    /// Live obstacles.
    #[must_use]
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Last checkpoint that spawned obstacles.
    #[must_use]
    pub const fn last_checkpoint(&self) -> u32 {
        self.last_checkpoint
    }

    /// Race time.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Result once finished.
    #[must_use]
    pub const fn result(&self) -> Option<RacerResult> {
        self.result
    }

    /// Whether the finish was reached.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    #[cfg(test)]
    pub(crate) fn place_obstacle(&mut self, lane: u8, y: f32) -> u32 {
        self.push_obstacle(lane, y);
        self.next_obstacle_id - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn settings(seed: u64, initial: bool) -> RacerSettings {
        RacerSettings {
            seed: Some(seed),
            seed_initial_obstacles: initial,
            ..RacerSettings::default()
        }
    }

    #[test]
    fn test_initial_sets() {
        let game = RacerGame::new(&settings(3, true));
        let n = game.obstacles().len();
        assert!((3..=6).contains(&n));
        for base in INITIAL_SETS {
            let set: Vec<_> = game
                .obstacles()
                .iter()
                .filter(|o| o.y >= base && o.y < base + 200.0)
                .collect();
            assert!(!set.is_empty() && set.len() <= 2);
            if let [a, b] = set[..] {
                assert_ne!(a.lane, b.lane);
            }
        }
        assert_eq!(game.lane(), START_LANE);
    }

    #[test]
    fn test_ten_taps_without_collision() {
        let mut game = RacerGame::new(&settings(1, false));
        for y in [300.0, 500.0, 900.0] {
            game.place_obstacle(0, y);
            game.place_obstacle(2, y);
        }
        let lanes_before: Vec<u8> = game.obstacles().iter().map(|o| o.lane).collect();

        for _ in 0..10 {
            let outcome = game.tap().unwrap();
            assert!(!outcome.slowed);
            assert_eq!(outcome.hits, 0);
        }
        assert_eq!(game.distance(), 10.0 * MOVE_DISTANCE);
        assert!((game.progress() - 10.0 * MOVE_DISTANCE / FINISH_DISTANCE * 100.0).abs() < 1e-4);
        let lanes_after: Vec<u8> = game.obstacles().iter().map(|o| o.lane).collect();
        assert_eq!(lanes_before, lanes_after);
        assert!(!game.is_slowed());
        assert_eq!(game.last_checkpoint(), 0);
    }

    #[test]
    fn test_collision_slows_for_five_percent() {
        let mut game = RacerGame::new(&settings(1, false));
        let id = game.place_obstacle(START_LANE, 100.0);

        let first = game.tap().unwrap();
        assert_eq!(first.hits, 1);
        assert!(!first.slowed);
        assert!(game.obstacles().iter().all(|o| o.id != id));
        assert!(game.is_slowed());

        for _ in 0..12 {
            let outcome = game.tap().unwrap();
            assert!(outcome.slowed);
        }
        assert_eq!(game.distance(), MOVE_DISTANCE + 12.0 * MOVE_DISTANCE / 2.0);
        assert!(!game.is_slowed());
        assert!(!game.tap().unwrap().slowed);
    }

    #[test]
    fn test_other_lane_is_not_hit() {
        let mut game = RacerGame::new(&settings(1, false));
        game.place_obstacle(0, 100.0);
        assert_eq!(game.tap().unwrap().hits, 0);
        assert_eq!(game.switch_lane(0), 0);
        assert_eq!(game.tick(), None);
        assert_eq!(game.obstacles().len(), 0);
        assert!(game.is_slowed());
    }

    #[test]
    fn test_lane_switch_is_absolute_and_clamped() {
        let mut game = RacerGame::new(&settings(1, false));
        assert_eq!(game.switch_lane(2), 2);
        assert_eq!(game.switch_lane(0), 0);
        assert_eq!(game.switch_lane(9), 2);
        assert_eq!(game.switch_lane(-4), 0);
    }

    #[test]
    fn test_checkpoint_spawns_clear_of_stacks() {
        let mut game = RacerGame::new(&settings(11, false));
        for _ in 0..12 {
            game.tap();
        }
        assert_eq!(game.last_checkpoint(), 10);
        let spawn_y = game.distance() + TRACK_HEIGHT;
        let spawned = game.obstacles();
        assert!((1..=2).contains(&spawned.len()));
        for o in spawned {
            assert!(o.y >= spawn_y && o.y < spawn_y + 200.0 + SPAWN_CLEARANCE);
        }
        if let [a, b] = spawned {
            assert_ne!(a.lane, b.lane);
        }
    }

    #[test]
    fn test_occupied_spawn_line_skips() {
        let mut game = RacerGame::new(&settings(11, false));
        for lane in 0..LANE_COUNT {
            // After 12 taps these sit at the spawn line.
            game.place_obstacle(lane, 150.0 + TRACK_HEIGHT + 12.0 * OBSTACLE_STEP);
        }
        game.switch_lane(0);
        for _ in 0..12 {
            game.tap();
        }
        assert_eq!(game.last_checkpoint(), 10);
        assert_eq!(game.obstacles().len(), 3);
    }

    #[test]
    fn test_progress_monotonic_and_removed_never_return() {
        let mut game = RacerGame::new(&settings(5, true));
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let mut gone = HashSet::new();
        let mut last_progress = 0.0;
        let mut previous: HashSet<u32> = game.obstacles().iter().map(|o| o.id).collect();

        for _ in 0..400 {
            if rng.gen_bool(0.3) {
                game.switch_lane(rng.gen_range(-1..4));
            }
            game.tap();
            game.tick();

            let current: HashSet<u32> = game.obstacles().iter().map(|o| o.id).collect();
            gone.extend(previous.difference(&current).copied());
            assert!(current.is_disjoint(&gone));
            assert!(game.progress() >= last_progress);
            last_progress = game.progress();
            previous = current;
            if game.is_finished() {
                break;
            }
        }
        assert!(game.is_finished());
    }

    #[test]
    fn test_finish_reports_score() {
        let mut game = RacerGame::new(&settings(1, false));
        game.switch_lane(0);
        let mut result = None;
        for _ in 0..2000 {
            game.tap();
            if let Some(r) = game.tick() {
                result = Some(r);
                break;
            }
        }
        let result = result.unwrap();
        assert!(game.progress() >= 100.0);
        assert_eq!(result.elapsed_secs, round_secs(game.elapsed()));
        assert_eq!(result.score, racer_score(result.elapsed_secs));
        assert!(game.tap().is_none());
        assert!(game.tick().is_none());
    }

    #[test]
    fn test_score_formula() {
        assert_eq!(racer_score(0), 1000);
        assert_eq!(racer_score(30), 700);
        assert_eq!(racer_score(90), 100);
        assert_eq!(racer_score(u64::MAX), 100);
    }
}
