//! # Session Directory
//!
//! Maps a session id to its participants and its append-only interaction log.
//!
//! Appending requires a [`Membership`], which only [`SessionDirectory::create_or_join`]
//! hands out, so an append can never precede a successful join.

use std::sync::Arc;

use gamehub_shared::{now_millis, Action, DeviceRole, InteractionId, ParticipantId, ParticipantRecord, SessionId};

use crate::error::SessionResult;
use crate::store::{InteractionDraft, SessionStore};

/// Proof that a participant joined a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Membership {
    /// Joined session.
    pub session: SessionId,
    /// The participant record that was stored.
    pub participant: ParticipantRecord,
}

impl Membership {
    /// The participant's id.
    #[inline]
    #[must_use]
    pub fn participant_id(&self) -> &ParticipantId {
        &self.participant.participant_id
    }
}

/// Directory operations over an injected store.
#[derive(Clone)]
pub struct SessionDirectory {
    store: Arc<dyn SessionStore>,
}

impl SessionDirectory {
    /// Creates a directory over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// The underlying store handle.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Adds a participant record to `session`.
    ///
    /// Repeated calls add further records; names are not deduplicated.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Connection` if the store is unreachable.
    pub fn create_or_join(
        &self,
        session: &SessionId,
        display_name: &str,
        role: DeviceRole,
    ) -> SessionResult<Membership> {
        let participant = ParticipantRecord {
            participant_id: ParticipantId::generate(&mut rand::thread_rng()),
            player_name: display_name.to_owned(),
            device_type: role,
            joined_at: now_millis(),
        };
        self.store.add_participant(session, participant.clone())?;
        tracing::info!(
            session = %session,
            "{} joined as {:?} (id: {})",
            display_name,
            role,
            participant.participant_id
        );
        Ok(Membership {
            session: session.clone(),
            participant,
        })
    }

    /// Removes exactly one participant record. No-op if already absent.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Connection` if the store is unreachable.
    pub fn leave(&self, session: &SessionId, participant: &ParticipantId) -> SessionResult<()> {
        if self.store.remove_participant(session, participant)? {
            tracing::info!(session = %session, "participant {} left", participant);
        }
        Ok(())
    }

    /// Appends an interaction on behalf of a joined participant.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Connection` if the store is unreachable.
    pub fn append(&self, membership: &Membership, action: Action) -> SessionResult<InteractionId> {
        let kind = action.kind().to_owned();
        let id = self.store.append_interaction(
            &membership.session,
            InteractionDraft {
                player_id: membership.participant.participant_id.clone(),
                player_name: membership.participant.player_name.clone(),
                action,
                timestamp: now_millis(),
            },
        )?;
        tracing::debug!(session = %membership.session, "appended {} as {}", kind, id);
        Ok(id)
    }

    /// Lists a session's participants in join order.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Connection` if the store is unreachable.
    pub fn participants(&self, session: &SessionId) -> SessionResult<Vec<ParticipantRecord>> {
        self.store.participants(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use crate::store::InMemoryStore;

    fn directory() -> (Arc<InMemoryStore>, SessionDirectory) {
        let store = Arc::new(InMemoryStore::default());
        let directory = SessionDirectory::new(store.clone());
        (store, directory)
    }

    #[test]
    fn test_join_twice_adds_two_records() {
        let (_, directory) = directory();
        let session = SessionId::new("room");
        let a = directory.create_or_join(&session, "ana", DeviceRole::Controller).unwrap();
        let b = directory.create_or_join(&session, "ana", DeviceRole::Controller).unwrap();
        assert_ne!(a.participant_id(), b.participant_id());
        assert_eq!(directory.participants(&session).unwrap().len(), 2);
    }

    #[test]
    fn test_join_fails_when_unreachable() {
        let (store, directory) = directory();
        store.set_reachable(false);
        let err = directory
            .create_or_join(&SessionId::new("room"), "ana", DeviceRole::Controller)
            .unwrap_err();
        assert!(matches!(err, SessionError::Connection { .. }));
    }

    #[test]
    fn test_leave_is_idempotent() {
        let (_, directory) = directory();
        let session = SessionId::new("room");
        let m = directory.create_or_join(&session, "ana", DeviceRole::Controller).unwrap();
        directory.leave(&session, m.participant_id()).unwrap();
        directory.leave(&session, m.participant_id()).unwrap();
        assert!(directory.participants(&session).unwrap().is_empty());
    }

    #[test]
    fn test_append_stamps_participant() {
        let (store, directory) = directory();
        let session = SessionId::new("room");
        let m = directory.create_or_join(&session, "bo", DeviceRole::Controller).unwrap();
        let id = directory.append(&m, Action::RacingTap).unwrap();
        let log = store.interactions(&session).unwrap();
        assert_eq!(log[0].id, id);
        assert_eq!(log[0].player_name, "bo");
        assert_eq!(&log[0].player_id, m.participant_id());
    }

    #[test]
    fn test_empty_session_is_valid() {
        let (_, directory) = directory();
        assert!(directory.participants(&SessionId::new("nobody")).unwrap().is_empty());
    }
}
