//! # Display Host
//!
//! The authoritative side of a session: one process, one active game.
//!
//! ## Frame Order
//!
//! ```text
//! 1. pump()            drain the subscription, route recognized actions
//!                      to the active game only
//! 2. advance(elapsed)  Memory timers / Platformer steps / Racer checks
//! 3. on match          publish `match-update` for the controllers; a failed
//!                      publish stays pending and is retried next frame
//! 4. on finish         report the record to the stats recorder, once
//! ```
//!
//! The host never schedules itself. Whoever owns it decides how often to
//! pump and how much time to feed in, so tests drive it with exact durations.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use gamehub_games::{
    GameKind, GameRecord, JumpOutcome, MemoryEvent, MemoryGame, PlatformerGame, RacerGame, StatsRecorder,
    TickLoop,
};
use gamehub_session::{InteractionSink, SessionClient, SessionStore, Subscription};
use gamehub_shared::constants::{DEFAULT_PLAYER_NAME, DISPLAY_NAME};
use gamehub_shared::{join_url, now_millis, Action, DeviceRole, HubConfig, InteractionRecord, ParticipantRecord, SessionId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::HubResult;

/// The game currently receiving interactions.
pub enum ActiveGame {
    /// Event-driven, with game-time reveal delays.
    Memory(MemoryGame),
    /// Stepped at the configured tick rate.
    Platformer {
        /// The simulation.
        game: PlatformerGame,
        /// Physics step scheduler.
        ticks: TickLoop,
    },
    /// Checked at the configured interval.
    Racing {
        /// The race.
        game: RacerGame,
        /// Collision/finish check scheduler.
        ticks: TickLoop,
    },
}

impl ActiveGame {
    /// Which game this is.
    #[must_use]
    pub const fn kind(&self) -> GameKind {
        match self {
            Self::Memory(_) => GameKind::Memory,
            Self::Platformer { .. } => GameKind::Platformer,
            Self::Racing { .. } => GameKind::Racing,
        }
    }
}

/// Counters for one [`DisplayHost::pump`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PumpReport {
    /// New interactions drained from the subscription.
    pub received: usize,
    /// Interactions the active game acted on.
    pub applied: usize,
    /// Interactions the active game does not handle, or refused.
    pub ignored: usize,
}

/// The main display of one session.
///
/// Field order matters for teardown: the subscription stops before the
/// client leaves the session.
pub struct DisplayHost<R: StatsRecorder> {
    subscription: Subscription,
    inbox: Receiver<InteractionRecord>,
    client: SessionClient,
    config: HubConfig,
    recorder: R,
    active: Option<ActiveGame>,
    /// Name on the most recent routed interaction.
    last_player: Option<String>,
    /// Set once the active game's record went to the recorder.
    reported: Option<GameRecord>,
    /// Matched set not yet published. Each update carries every match so
    /// far, so only the latest is kept.
    pending_reflection: Option<Vec<usize>>,
    rng: ChaCha8Rng,
}

impl<R: StatsRecorder> DisplayHost<R> {
    /// Creates a display session, joins it and subscribes to its log.
    ///
    /// # Errors
    ///
    /// Returns `HubError::Session` if the store is unreachable.
    pub fn open(config: HubConfig, store: Arc<dyn SessionStore>, recorder: R) -> HubResult<Self> {
        Self::open_session(config, store, recorder, SessionId::for_display(now_millis()))
    }

    /// As [`DisplayHost::open`] with a caller-chosen session id.
    ///
    /// # Errors
    ///
    /// Returns `HubError::Session` if the store is unreachable.
    pub fn open_session(
        config: HubConfig,
        store: Arc<dyn SessionStore>,
        recorder: R,
        session: SessionId,
    ) -> HubResult<Self> {
        let mut client = SessionClient::new(store);
        client.join(session.clone(), DISPLAY_NAME, DeviceRole::MainDisplay)?;
        let (subscription, inbox) = client.subscribe_queue()?;
        let rng = ChaCha8Rng::seed_from_u64(config.platformer.seed.unwrap_or_else(|| rand::thread_rng().gen()));
        tracing::info!(session = %session, "display open at {}", join_url(&config.session.origin, &session));
        Ok(Self {
            subscription,
            inbox,
            client,
            config,
            recorder,
            active: None,
            last_player: None,
            reported: None,
            pending_reflection: None,
            rng,
        })
    }

    /// Starts `kind`, discarding whatever game was active.
    pub fn start(&mut self, kind: GameKind) {
        let game = match kind {
            GameKind::Memory => ActiveGame::Memory(MemoryGame::new(self.config.memory.clone(), &mut self.rng)),
            GameKind::Platformer => ActiveGame::Platformer {
                game: PlatformerGame::new(self.config.platformer.tick_rate, &mut self.rng),
                ticks: TickLoop::new(self.config.platformer.tick_rate),
            },
            GameKind::Racing => ActiveGame::Racing {
                game: RacerGame::new(&self.config.racer),
                ticks: TickLoop::with_interval(Duration::from_millis(self.config.racer.tick_interval_ms)),
            },
        };
        self.install(game);
    }

    /// Starts a memory game on a fixed board.
    ///
    /// # Errors
    ///
    /// Returns `HubError::Game` if `layout` is not a valid board.
    pub fn start_memory_with_layout(&mut self, layout: &[u8]) -> HubResult<()> {
        let game = MemoryGame::with_layout(self.config.memory.clone(), layout)?;
        self.install(ActiveGame::Memory(game));
        Ok(())
    }

    /// Replaces the active game with a prepared one.
    pub fn install(&mut self, game: ActiveGame) {
        if let Some(previous) = &self.active {
            tracing::info!(session = %self.session_id(), "{} discarded", previous.kind());
        }
        tracing::info!(session = %self.session_id(), "{} started", game.kind());
        self.active = Some(game);
        self.last_player = None;
        self.reported = None;
        self.pending_reflection = None;
    }

    /// Stops the active game without reporting it.
    pub fn stop(&mut self) {
        if let Some(game) = self.active.take() {
            tracing::info!(session = %self.session_id(), "{} stopped", game.kind());
        }
    }

    /// Delivers new interactions to the active game.
    ///
    /// # Errors
    ///
    /// Returns `HubError::Session` if the store is unreachable; the next
    /// pump retries and nothing is delivered twice.
    pub fn pump(&mut self) -> HubResult<PumpReport> {
        self.publish_reflection()?;
        self.subscription.pump()?;
        let records: Vec<InteractionRecord> = self.inbox.try_iter().collect();

        let mut report = PumpReport {
            received: records.len(),
            ..PumpReport::default()
        };
        for record in &records {
            if self.route(record) {
                report.applied += 1;
            } else {
                report.ignored += 1;
            }
        }
        Ok(report)
    }

    /// Applies one interaction. Returns whether the active game acted on it.
    fn route(&mut self, record: &InteractionRecord) -> bool {
        if record.action.is_reflection() {
            return false;
        }
        let Some(active) = &mut self.active else {
            tracing::debug!("{} from {} ignored, no active game", record.action.kind(), record.player_name);
            return false;
        };

        let applied = match (active, &record.action) {
            (ActiveGame::Memory(game), Action::MemoryCardSelect { card_position }) => {
                match game.select(*card_position) {
                    Ok(selection) => {
                        tracing::debug!("{} selected {:?}", record.player_name, selection);
                        true
                    }
                    Err(rejection) => {
                        tracing::debug!("{} selection refused: {:?}", record.player_name, rejection);
                        false
                    }
                }
            }
            (ActiveGame::Platformer { game, .. }, Action::JumpAction) => {
                let outcome = game.jump();
                tracing::debug!("{} jump: {:?}", record.player_name, outcome);
                !matches!(outcome, JumpOutcome::Ignored)
            }
            (ActiveGame::Racing { game, .. }, Action::RacingTap) => game.tap().is_some(),
            (ActiveGame::Racing { game, .. }, Action::RacingLaneSwitch { lane }) => {
                let lane = game.switch_lane(*lane);
                tracing::debug!("{} switched to lane {}", record.player_name, lane);
                true
            }
            (active, action) => {
                tracing::debug!("{} ignored by {}", action.kind(), active.kind());
                false
            }
        };

        if applied {
            self.last_player = Some(record.player_name.clone());
        }
        applied
    }

    /// Advances game time by `elapsed`.
    ///
    /// Returns the record if the active game finished during this call.
    ///
    /// # Errors
    ///
    /// Returns `HubError::Session` if a `match-update` could not be published
    /// and no game finished. Game state has advanced regardless, and the
    /// update stays pending for the next `advance` or `pump`. A finished
    /// record is always returned.
    pub fn advance(&mut self, elapsed: Duration) -> HubResult<Option<GameRecord>> {
        let finished = match &mut self.active {
            None => None,
            Some(ActiveGame::Memory(game)) => {
                let mut won = None;
                for event in game.advance(elapsed) {
                    match event {
                        MemoryEvent::MatchUpdate { matched_cards } => {
                            self.pending_reflection = Some(matched_cards);
                        }
                        MemoryEvent::FlippedBack(cards) => tracing::debug!("cards {:?} flipped back", cards),
                        MemoryEvent::Won(result) => {
                            won = Some((GameKind::Memory, result.score, result.moves, result.elapsed_secs));
                        }
                    }
                }
                won
            }
            Some(ActiveGame::Platformer { game, ticks }) => {
                let due = ticks.advance(elapsed);
                (0..due).find_map(|_| game.step()).map(|result| {
                    (GameKind::Platformer, result.max_height, 0, result.elapsed_secs())
                })
            }
            Some(ActiveGame::Racing { game, ticks }) => {
                let due = ticks.advance(elapsed);
                (0..due)
                    .find_map(|_| game.tick())
                    .map(|result| (GameKind::Racing, result.score, 0, result.elapsed_secs))
            }
        };

        let record = finished.and_then(|(kind, score, moves, secs)| self.report(kind, score, moves, secs));
        match (self.publish_reflection(), record) {
            (Err(err), None) => Err(err),
            (_, record) => Ok(record),
        }
    }

    /// Sends the pending matched set, keeping it pending on failure.
    fn publish_reflection(&mut self) -> HubResult<()> {
        let Some(matched_cards) = self.pending_reflection.take() else {
            return Ok(());
        };
        if let Err(err) = self.client.send(Action::MatchUpdate {
            matched_cards: matched_cards.clone(),
        }) {
            tracing::warn!(session = %self.session_id(), "match-update not published, will retry: {}", err);
            self.pending_reflection = Some(matched_cards);
            return Err(err.into());
        }
        Ok(())
    }

    /// Whether a `match-update` is waiting to be published.
    #[must_use]
    pub fn has_pending_reflection(&self) -> bool {
        self.pending_reflection.is_some()
    }

    fn report(&mut self, kind: GameKind, score: u32, moves: u32, elapsed_secs: u64) -> Option<GameRecord> {
        if self.reported.is_some() {
            return None;
        }
        let player = self.last_player.as_deref().unwrap_or(DEFAULT_PLAYER_NAME);
        let record = GameRecord::new(player, kind, score, moves, elapsed_secs);
        tracing::info!(
            session = %self.session_id(),
            "{} finished: {} scored {}",
            kind,
            record.player_name,
            record.score
        );
        self.recorder.record_game(record.clone());
        self.reported = Some(record.clone());
        Some(record)
    }

    /// The session this display owns.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        self.subscription.session()
    }

    /// URL controllers open to join.
    #[must_use]
    pub fn join_url(&self) -> String {
        join_url(&self.config.session.origin, self.session_id())
    }

    /// Participants currently joined, display included.
    ///
    /// # Errors
    ///
    /// Returns `HubError::Session` if the store is unreachable.
    pub fn participants(&self) -> HubResult<Vec<ParticipantRecord>> {
        Ok(self.client.participants()?)
    }

    /// The active game.
    #[must_use]
    pub fn active(&self) -> Option<&ActiveGame> {
        self.active.as_ref()
    }

    /// The active memory game, if that is what is running.
    #[must_use]
    pub fn memory(&self) -> Option<&MemoryGame> {
        match &self.active {
            Some(ActiveGame::Memory(game)) => Some(game),
            _ => None,
        }
    }

    /// The active platformer, if that is what is running.
    #[must_use]
    pub fn platformer(&self) -> Option<&PlatformerGame> {
        match &self.active {
            Some(ActiveGame::Platformer { game, .. }) => Some(game),
            _ => None,
        }
    }

    /// The active race, if that is what is running.
    #[must_use]
    pub fn racer(&self) -> Option<&RacerGame> {
        match &self.active {
            Some(ActiveGame::Racing { game, .. }) => Some(game),
            _ => None,
        }
    }

    /// The record reported for the active game, once it finished.
    #[must_use]
    pub fn outcome(&self) -> Option<&GameRecord> {
        self.reported.as_ref()
    }

    /// The stats recorder.
    #[must_use]
    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    /// Interactions seen by this display so far.
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.subscription.seen_count()
    }
}
