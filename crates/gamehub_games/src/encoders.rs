//! # Controller Input Encoders
//!
//! Turn one controller gesture into at most one appended interaction.
//!
//! Encoders never fail outward. A join or send error is logged and reduced
//! to [`EncodeOutcome::Dropped`]; a dropped input must not take the
//! controller down with it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use gamehub_session::InteractionSink;
use gamehub_shared::config::EncoderSettings;
use gamehub_shared::{Action, InteractionId, LANE_COUNT};
use parking_lot::Mutex;

use crate::error::GameError;

/// Why an encoder chose not to send.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Suppression {
    /// A previous send has not returned yet.
    InFlight,
    /// Less than the minimum gap since the last emission.
    TooSoon,
    /// The previous emission's acknowledgment window is still open.
    AwaitingAck,
    /// The target is already locked on this controller's reflection.
    Locked,
}

/// Result of one gesture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodeOutcome {
    /// Appended under this id.
    Sent(InteractionId),
    /// Deliberately not sent.
    Suppressed(Suppression),
    /// Tried and failed, or the gesture was invalid.
    Dropped(GameError),
}

impl EncodeOutcome {
    /// Whether an interaction was appended.
    #[must_use]
    pub const fn is_sent(&self) -> bool {
        matches!(self, Self::Sent(_))
    }
}

fn deliver<S: InteractionSink + ?Sized>(sink: &S, action: Action) -> EncodeOutcome {
    let kind = action.kind().to_owned();
    match sink.send(action) {
        Ok(id) => EncodeOutcome::Sent(id),
        Err(err) => {
            tracing::warn!("dropping {}: {}", kind, err);
            EncodeOutcome::Dropped(err.into())
        }
    }
}

/// Memory controller: `memory-card-select {cardPosition}`.
#[derive(Debug, Default)]
pub struct MemoryEncoder {
    in_flight: AtomicBool,
}

impl MemoryEncoder {
    /// Creates an idle encoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends a card selection unless one is already in flight.
    pub fn select<S: InteractionSink + ?Sized>(&self, sink: &S, card_position: usize) -> EncodeOutcome {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            tracing::debug!("card {} re-tap dropped, send in flight", card_position);
            return EncodeOutcome::Suppressed(Suppression::InFlight);
        }
        let card_position = i64::try_from(card_position).unwrap_or(i64::MAX);
        let outcome = deliver(sink, Action::MemoryCardSelect { card_position });
        self.in_flight.store(false, Ordering::Release);
        outcome
    }

    /// Whether a send is in flight.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

#[derive(Debug, Default)]
struct JumpGate {
    last_emit: Option<Instant>,
    ack_until: Option<Instant>,
}

/// Platformer controller: `jump-action {}`.
///
/// The display decides whether a press starts or releases a charge; this
/// only keeps one gesture from turning into several presses.
#[derive(Debug)]
pub struct JumpEncoder {
    min_gap: Duration,
    ack_window: Duration,
    gate: Mutex<JumpGate>,
}

impl JumpEncoder {
    /// Creates an encoder with the given throttling.
    #[must_use]
    pub fn new(settings: &EncoderSettings) -> Self {
        Self {
            min_gap: Duration::from_millis(settings.min_gap_ms),
            ack_window: Duration::from_millis(settings.ack_window_ms),
            gate: Mutex::new(JumpGate::default()),
        }
    }

    /// Sends a jump press at `now` unless throttled.
    pub fn press<S: InteractionSink + ?Sized>(&self, sink: &S, now: Instant) -> EncodeOutcome {
        {
            let mut gate = self.gate.lock();
            if let Some(last) = gate.last_emit {
                if now.saturating_duration_since(last) < self.min_gap {
                    return EncodeOutcome::Suppressed(Suppression::TooSoon);
                }
            }
            if gate.ack_until.map_or(false, |until| now < until) {
                return EncodeOutcome::Suppressed(Suppression::AwaitingAck);
            }
            gate.last_emit = Some(now);
            gate.ack_until = now.checked_add(self.ack_window);
        }

        let outcome = deliver(sink, Action::JumpAction);
        if !outcome.is_sent() {
            // A failed send does not hold the button down.
            self.gate.lock().ack_until = None;
        }
        outcome
    }
}

impl Default for JumpEncoder {
    fn default() -> Self {
        Self::new(&EncoderSettings::default())
    }
}

/// Racer controller: `racing-tap {}` and `racing-lane-switch {lane}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RacerEncoder;

impl RacerEncoder {
    /// Sends a forward tap.
    pub fn tap<S: InteractionSink + ?Sized>(&self, sink: &S) -> EncodeOutcome {
        deliver(sink, Action::RacingTap)
    }

    /// Sends an absolute lane. Lanes outside `0..3` are dropped unsent.
    pub fn switch_lane<S: InteractionSink + ?Sized>(&self, sink: &S, lane: u8) -> EncodeOutcome {
        if lane >= LANE_COUNT {
            tracing::warn!("dropping racing-lane-switch: lane {} out of range", lane);
            return EncodeOutcome::Dropped(GameError::invalid(format!("lane {lane} outside 0..{LANE_COUNT}")));
        }
        deliver(sink, Action::RacingLaneSwitch { lane: i64::from(lane) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamehub_session::{SessionError, SessionResult};

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<Action>>,
        failing: AtomicBool,
    }

    impl InteractionSink for RecordingSink {
        fn send(&self, action: Action) -> SessionResult<InteractionId> {
            if self.failing.load(Ordering::Relaxed) {
                return Err(SessionError::connection("offline"));
            }
            let mut sent = self.sent.lock();
            sent.push(action);
            Ok(InteractionId::from_sequence(sent.len() as u64))
        }
    }

    struct ReentrantSink<'a> {
        encoder: &'a MemoryEncoder,
        inner: Mutex<Option<EncodeOutcome>>,
        sent: Mutex<Vec<Action>>,
    }

    impl InteractionSink for ReentrantSink<'_> {
        fn send(&self, action: Action) -> SessionResult<InteractionId> {
            self.sent.lock().push(action);
            let inner = self.encoder.select(self, 5);
            *self.inner.lock() = Some(inner);
            Ok(InteractionId::from_sequence(1))
        }
    }

    #[test]
    fn test_memory_select_payload() {
        let sink = RecordingSink::default();
        let encoder = MemoryEncoder::new();
        assert!(encoder.select(&sink, 7).is_sent());
        assert_eq!(*sink.sent.lock(), vec![Action::MemoryCardSelect { card_position: 7 }]);
        assert!(!encoder.is_in_flight());
    }

    #[test]
    fn test_memory_retap_while_in_flight_dropped() {
        let encoder = MemoryEncoder::new();
        let sink = ReentrantSink {
            encoder: &encoder,
            inner: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
        };
        assert!(encoder.select(&sink, 4).is_sent());
        assert_eq!(
            *sink.inner.lock(),
            Some(EncodeOutcome::Suppressed(Suppression::InFlight))
        );
        assert_eq!(sink.sent.lock().len(), 1);
    }

    #[test]
    fn test_memory_send_failure_releases() {
        let sink = RecordingSink::default();
        sink.failing.store(true, Ordering::Relaxed);
        let encoder = MemoryEncoder::new();
        assert!(matches!(encoder.select(&sink, 1), EncodeOutcome::Dropped(GameError::Session(_))));
        sink.failing.store(false, Ordering::Relaxed);
        assert!(encoder.select(&sink, 1).is_sent());
    }

    #[test]
    fn test_jump_throttling() {
        let sink = RecordingSink::default();
        let encoder = JumpEncoder::default();
        let t0 = Instant::now();

        assert!(encoder.press(&sink, t0).is_sent());
        assert_eq!(
            encoder.press(&sink, t0 + Duration::from_millis(30)),
            EncodeOutcome::Suppressed(Suppression::TooSoon)
        );
        assert_eq!(
            encoder.press(&sink, t0 + Duration::from_millis(70)),
            EncodeOutcome::Suppressed(Suppression::AwaitingAck)
        );
        assert!(encoder.press(&sink, t0 + Duration::from_millis(100)).is_sent());
        assert_eq!(*sink.sent.lock(), vec![Action::JumpAction, Action::JumpAction]);
    }

    #[test]
    fn test_jump_failure_closes_ack_window() {
        let sink = RecordingSink::default();
        let encoder = JumpEncoder::default();
        let t0 = Instant::now();

        sink.failing.store(true, Ordering::Relaxed);
        assert!(matches!(encoder.press(&sink, t0), EncodeOutcome::Dropped(_)));
        sink.failing.store(false, Ordering::Relaxed);
        assert_eq!(
            encoder.press(&sink, t0 + Duration::from_millis(10)),
            EncodeOutcome::Suppressed(Suppression::TooSoon)
        );
        assert!(encoder.press(&sink, t0 + Duration::from_millis(60)).is_sent());
    }

    #[test]
    fn test_racer_actions() {
        let sink = RecordingSink::default();
        let encoder = RacerEncoder;
        assert!(encoder.tap(&sink).is_sent());
        assert!(encoder.switch_lane(&sink, 2).is_sent());
        assert!(matches!(
            encoder.switch_lane(&sink, 3),
            EncodeOutcome::Dropped(GameError::InvalidInput { .. })
        ));
        assert_eq!(
            *sink.sent.lock(),
            vec![Action::RacingTap, Action::RacingLaneSwitch { lane: 2 }]
        );
    }

    #[test]
    fn test_not_joined_is_dropped_quietly() {
        let store = std::sync::Arc::new(gamehub_session::InMemoryStore::default());
        let client = gamehub_session::SessionClient::new(store);
        let outcome = RacerEncoder.tap(&client);
        assert!(matches!(
            outcome,
            EncodeOutcome::Dropped(GameError::Session(SessionError::NotJoined { .. }))
        ));
    }
}
