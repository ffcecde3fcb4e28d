//! # Controller Pad
//!
//! A phone's side of a session. Joins by URL, turns gestures into
//! interactions through the encoders and mirrors the display's matched-card
//! reflection so locked cards can be refused before they are sent.
//!
//! Nothing here is authoritative. The reflection only ever grows, and the
//! display re-checks every selection on its own board anyway.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::Receiver;
use gamehub_games::{EncodeOutcome, JumpEncoder, MemoryEncoder, RacerEncoder, Suppression};
use gamehub_session::{SessionClient, SessionStore, Subscription};
use gamehub_shared::config::EncoderSettings;
use gamehub_shared::{parse_join_url, Action, DeviceRole, InteractionRecord, SessionId};

use crate::error::{HubError, HubResult};

/// One joined controller.
pub struct ControllerPad {
    subscription: Subscription,
    inbox: Receiver<InteractionRecord>,
    client: SessionClient,
    player_name: String,
    memory: MemoryEncoder,
    jump: JumpEncoder,
    racer: RacerEncoder,
    matched: BTreeSet<usize>,
}

impl ControllerPad {
    /// Joins `session` as a controller named `player_name`.
    ///
    /// # Errors
    ///
    /// Returns `HubError::Session` if the store is unreachable; nothing is
    /// left joined in that case.
    pub fn join(
        store: Arc<dyn SessionStore>,
        session: SessionId,
        player_name: &str,
        encoders: &EncoderSettings,
    ) -> HubResult<Self> {
        let mut client = SessionClient::new(store);
        client.join(session, player_name, DeviceRole::Controller)?;
        let (subscription, inbox) = client.subscribe_queue()?;
        Ok(Self {
            subscription,
            inbox,
            client,
            player_name: player_name.to_owned(),
            memory: MemoryEncoder::new(),
            jump: JumpEncoder::new(encoders),
            racer: RacerEncoder,
            matched: BTreeSet::new(),
        })
    }

    /// Joins the session named in a scanned join URL.
    ///
    /// # Errors
    ///
    /// Returns `HubError::InvalidJoinUrl` if the URL has no session id,
    /// otherwise as [`ControllerPad::join`].
    pub fn join_url(
        store: Arc<dyn SessionStore>,
        url: &str,
        player_name: &str,
        encoders: &EncoderSettings,
    ) -> HubResult<Self> {
        let session = parse_join_url(url).ok_or_else(|| HubError::InvalidJoinUrl(url.to_owned()))?;
        Self::join(store, session, player_name, encoders)
    }

    /// Pulls new interactions and updates the matched-card reflection.
    ///
    /// Returns how many `match-update`s arrived.
    ///
    /// # Errors
    ///
    /// Returns `HubError::Session` if the store is unreachable.
    pub fn refresh(&mut self) -> HubResult<usize> {
        self.subscription.pump()?;
        let mut updates = 0;
        for record in self.inbox.try_iter() {
            if let Action::MatchUpdate { matched_cards } = record.action {
                self.matched.extend(matched_cards);
                updates += 1;
            }
        }
        if updates > 0 {
            tracing::debug!("{} now sees {} matched card(s)", self.player_name, self.matched.len());
        }
        Ok(updates)
    }

    /// Taps a memory card. Cards already matched are refused locally.
    pub fn select_card(&self, position: usize) -> EncodeOutcome {
        if self.matched.contains(&position) {
            tracing::debug!("card {} is locked, tap ignored", position);
            return EncodeOutcome::Suppressed(Suppression::Locked);
        }
        self.memory.select(&self.client, position)
    }

    /// Presses the jump button now.
    pub fn jump(&self) -> EncodeOutcome {
        self.jump_at(Instant::now())
    }

    /// Presses the jump button at `now`.
    pub fn jump_at(&self, now: Instant) -> EncodeOutcome {
        self.jump.press(&self.client, now)
    }

    /// Taps the racer forward button.
    pub fn tap(&self) -> EncodeOutcome {
        self.racer.tap(&self.client)
    }

    /// Selects a racer lane.
    pub fn switch_lane(&self, lane: u8) -> EncodeOutcome {
        self.racer.switch_lane(&self.client, lane)
    }

    /// Matched card positions as last reflected, ascending.
    #[must_use]
    pub fn matched_cards(&self) -> Vec<usize> {
        self.matched.iter().copied().collect()
    }

    /// This controller's name.
    #[must_use]
    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    /// The joined session.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        self.subscription.session()
    }
}
