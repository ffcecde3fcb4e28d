//! # Session Store
//!
//! The seam between the session layer and whatever actually holds session
//! data (a real-time database in production, memory in tests and demos).
//!
//! ## Design
//!
//! ```text
//!  append ──> ┌──────────────────────────┐ ──> StoreNotice ──> watcher 1
//!             │ session                  │ ──> StoreNotice ──> watcher 2
//!             │  participants: [..]      │
//!             │  log: [i1, i2, i3, ...]  │ <── snapshot read on notice
//!             └──────────────────────────┘
//! ```
//!
//! Watchers receive a notice per append and then read an ordered snapshot.
//! A dropped or duplicated notice is harmless: consumers decide what is new
//! by interaction id, never by notice count.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use gamehub_shared::{Action, InteractionId, InteractionRecord, ParticipantId, ParticipantRecord, SessionId};
use parking_lot::{Mutex, RwLock};

use crate::error::{SessionError, SessionResult};

/// Change notification sent to watchers of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreNotice {
    /// An interaction was appended.
    Appended(InteractionId),
    /// The log should be re-read (e.g. after a transport hiccup).
    Resync,
}

/// An interaction before the store assigns its id.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionDraft {
    /// Appending participant.
    pub player_id: ParticipantId,
    /// Appending participant's name.
    pub player_name: String,
    /// The action.
    pub action: Action,
    /// Client-side timestamp (ms since epoch).
    pub timestamp: u64,
}

/// Backing store for sessions.
///
/// Every operation may fail with [`SessionError::Connection`].
pub trait SessionStore: Send + Sync {
    /// Adds a participant record to a session, creating the session if needed.
    fn add_participant(&self, session: &SessionId, record: ParticipantRecord) -> SessionResult<()>;

    /// Removes a participant. Returns whether a record was removed.
    fn remove_participant(&self, session: &SessionId, participant: &ParticipantId) -> SessionResult<bool>;

    /// Lists participants in join order.
    fn participants(&self, session: &SessionId) -> SessionResult<Vec<ParticipantRecord>>;

    /// Appends an interaction and returns its assigned id.
    fn append_interaction(&self, session: &SessionId, draft: InteractionDraft) -> SessionResult<InteractionId>;

    /// Returns the session log in append order.
    fn interactions(&self, session: &SessionId) -> SessionResult<Vec<InteractionRecord>>;

    /// Returns the log from position `start` on, in append order.
    ///
    /// A `start` past the end yields an empty list.
    fn interactions_since(&self, session: &SessionId, start: usize) -> SessionResult<Vec<InteractionRecord>> {
        Ok(self.interactions(session)?.into_iter().skip(start).collect())
    }

    /// Registers a watcher. The receiver disconnects if the transport drops.
    fn watch(&self, session: &SessionId) -> SessionResult<Receiver<StoreNotice>>;
}

#[derive(Default)]
struct SessionEntry {
    participants: Vec<ParticipantRecord>,
    log: Vec<InteractionRecord>,
    next_seq: u64,
}

/// In-process [`SessionStore`].
///
/// Lost when the process exits. Supports failure injection so callers can
/// exercise the unreachable-store and dropped-transport paths.
pub struct InMemoryStore {
    /// Session data.
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
    /// Watch channels per session.
    watchers: Mutex<HashMap<SessionId, Vec<Sender<StoreNotice>>>>,
    /// Cleared to simulate an unreachable store.
    reachable: AtomicBool,
    /// Capacity of each watch channel.
    capacity: usize,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            watchers: Mutex::new(HashMap::new()),
            reachable: AtomicBool::new(true),
            capacity: capacity.max(1),
        }
    }

    /// Marks the store reachable or unreachable.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::Relaxed);
        tracing::info!("in-memory store reachable = {}", reachable);
    }

    /// Closes every watch channel of a session, as a transport drop would.
    pub fn drop_watchers(&self, session: &SessionId) {
        let dropped = self.watchers.lock().remove(session).map_or(0, |w| w.len());
        tracing::warn!(session = %session, "dropped {} watcher(s)", dropped);
    }

    /// Re-sends a resync notice to every watcher of a session.
    pub fn renotify(&self, session: &SessionId) {
        self.notify(session, &StoreNotice::Resync);
    }

    /// Number of live watchers on a session.
    #[must_use]
    pub fn watcher_count(&self, session: &SessionId) -> usize {
        self.watchers.lock().get(session).map_or(0, Vec::len)
    }

    fn check_reachable(&self) -> SessionResult<()> {
        if self.reachable.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(SessionError::connection("in-memory store marked unreachable"))
        }
    }

    fn notify(&self, session: &SessionId, notice: &StoreNotice) {
        let mut watchers = self.watchers.lock();
        if let Some(list) = watchers.get_mut(session) {
            // A full channel already has a pending notice, which is enough.
            list.retain(|tx| !matches!(tx.try_send(notice.clone()), Err(TrySendError::Disconnected(_))));
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(gamehub_shared::constants::CHANNEL_CAPACITY)
    }
}

impl SessionStore for InMemoryStore {
    fn add_participant(&self, session: &SessionId, record: ParticipantRecord) -> SessionResult<()> {
        self.check_reachable()?;
        self.sessions
            .write()
            .entry(session.clone())
            .or_default()
            .participants
            .push(record);
        Ok(())
    }

    fn remove_participant(&self, session: &SessionId, participant: &ParticipantId) -> SessionResult<bool> {
        self.check_reachable()?;
        let mut sessions = self.sessions.write();
        let Some(entry) = sessions.get_mut(session) else {
            return Ok(false);
        };
        let before = entry.participants.len();
        entry.participants.retain(|p| &p.participant_id != participant);
        Ok(entry.participants.len() != before)
    }

    fn participants(&self, session: &SessionId) -> SessionResult<Vec<ParticipantRecord>> {
        self.check_reachable()?;
        Ok(self
            .sessions
            .read()
            .get(session)
            .map(|e| e.participants.clone())
            .unwrap_or_default())
    }

    fn append_interaction(&self, session: &SessionId, draft: InteractionDraft) -> SessionResult<InteractionId> {
        self.check_reachable()?;
        let id = {
            let mut sessions = self.sessions.write();
            let entry = sessions.entry(session.clone()).or_default();
            entry.next_seq += 1;
            let id = InteractionId::from_sequence(entry.next_seq);
            entry.log.push(InteractionRecord {
                id: id.clone(),
                player_id: draft.player_id,
                player_name: draft.player_name,
                action: draft.action,
                timestamp: draft.timestamp,
            });
            id
        };
        self.notify(session, &StoreNotice::Appended(id.clone()));
        Ok(id)
    }

    fn interactions(&self, session: &SessionId) -> SessionResult<Vec<InteractionRecord>> {
        self.check_reachable()?;
        Ok(self
            .sessions
            .read()
            .get(session)
            .map(|e| e.log.clone())
            .unwrap_or_default())
    }

    fn interactions_since(&self, session: &SessionId, start: usize) -> SessionResult<Vec<InteractionRecord>> {
        self.check_reachable()?;
        Ok(self
            .sessions
            .read()
            .get(session)
            .and_then(|e| e.log.get(start..))
            .map(<[InteractionRecord]>::to_vec)
            .unwrap_or_default())
    }

    fn watch(&self, session: &SessionId) -> SessionResult<Receiver<StoreNotice>> {
        self.check_reachable()?;
        let (tx, rx) = bounded(self.capacity);
        self.watchers.lock().entry(session.clone()).or_default().push(tx);
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamehub_shared::DeviceRole;

    fn draft(action: Action) -> InteractionDraft {
        InteractionDraft {
            player_id: ParticipantId::new("p1"),
            player_name: "ana".into(),
            action,
            timestamp: 1,
        }
    }

    fn participant(id: &str) -> ParticipantRecord {
        ParticipantRecord {
            participant_id: ParticipantId::new(id),
            player_name: id.to_uppercase(),
            device_type: DeviceRole::Controller,
            joined_at: 0,
        }
    }

    #[test]
    fn test_append_assigns_increasing_ids() {
        let store = InMemoryStore::default();
        let session = SessionId::new("s");
        let a = store.append_interaction(&session, draft(Action::RacingTap)).unwrap();
        let b = store.append_interaction(&session, draft(Action::JumpAction)).unwrap();
        assert!(a < b);

        let log = store.interactions(&session).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].id, a);
        assert_eq!(log[1].action, Action::JumpAction);
    }

    #[test]
    fn test_interactions_since_returns_tail() {
        let store = InMemoryStore::default();
        let session = SessionId::new("s");
        store.append_interaction(&session, draft(Action::RacingTap)).unwrap();
        let b = store.append_interaction(&session, draft(Action::JumpAction)).unwrap();

        let tail = store.interactions_since(&session, 1).unwrap();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].id, b);
        assert!(store.interactions_since(&session, 5).unwrap().is_empty());
        assert!(store.interactions_since(&SessionId::new("none"), 0).unwrap().is_empty());
    }

    #[test]
    fn test_watchers_are_notified() {
        let store = InMemoryStore::default();
        let session = SessionId::new("s");
        let rx = store.watch(&session).unwrap();
        let id = store.append_interaction(&session, draft(Action::RacingTap)).unwrap();
        assert_eq!(rx.try_recv().unwrap(), StoreNotice::Appended(id));
    }

    #[test]
    fn test_unreachable_store_fails_every_call() {
        let store = InMemoryStore::default();
        let session = SessionId::new("s");
        store.set_reachable(false);
        assert!(matches!(
            store.add_participant(&session, participant("a")),
            Err(SessionError::Connection { .. })
        ));
        assert!(store.watch(&session).is_err());
        assert!(store.interactions(&session).is_err());
        store.set_reachable(true);
        assert!(store.interactions(&session).unwrap().is_empty());
    }

    #[test]
    fn test_remove_participant() {
        let store = InMemoryStore::default();
        let session = SessionId::new("s");
        store.add_participant(&session, participant("a")).unwrap();
        store.add_participant(&session, participant("b")).unwrap();
        assert!(store.remove_participant(&session, &ParticipantId::new("a")).unwrap());
        assert!(!store.remove_participant(&session, &ParticipantId::new("a")).unwrap());
        let left = store.participants(&session).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].participant_id.as_str(), "b");
    }

    #[test]
    fn test_drop_watchers_disconnects() {
        let store = InMemoryStore::default();
        let session = SessionId::new("s");
        let rx = store.watch(&session).unwrap();
        assert_eq!(store.watcher_count(&session), 1);
        store.drop_watchers(&session);
        assert_eq!(store.watcher_count(&session), 0);
        assert!(matches!(rx.try_recv(), Err(crossbeam_channel::TryRecvError::Disconnected)));
    }

    #[test]
    fn test_full_watch_channel_keeps_watcher() {
        let store = InMemoryStore::new(1);
        let session = SessionId::new("s");
        let _rx = store.watch(&session).unwrap();
        store.append_interaction(&session, draft(Action::RacingTap)).unwrap();
        store.append_interaction(&session, draft(Action::RacingTap)).unwrap();
        assert_eq!(store.watcher_count(&session), 1);
    }
}
