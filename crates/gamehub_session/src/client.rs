//! # Session Client
//!
//! The per-process session object. Owns the injected store handle and this
//! process's membership, and leaves the session when dropped.
//!
//! ```rust,ignore
//! let store: Arc<dyn SessionStore> = Arc::new(InMemoryStore::default());
//! let mut client = SessionClient::new(store);
//! client.join(session, "ana", DeviceRole::Controller)?;
//! client.send(Action::RacingTap)?;
//! // dropping `client` removes ana's participant record
//! ```

use std::sync::Arc;

use crossbeam_channel::Receiver;
use gamehub_shared::{Action, DeviceRole, InteractionId, InteractionRecord, ParticipantRecord, SessionId};

use crate::channel::{InteractionChannel, Subscription};
use crate::directory::{Membership, SessionDirectory};
use crate::error::{SessionError, SessionResult};
use crate::store::SessionStore;

/// Anything an encoder can append interactions through.
pub trait InteractionSink {
    /// Appends `action` to the joined session.
    ///
    /// # Errors
    ///
    /// `SessionError::NotJoined` before a join, `SessionError::Connection`
    /// if the store is unreachable.
    fn send(&self, action: Action) -> SessionResult<InteractionId>;
}

/// Explicitly constructed session handle for one display or controller.
pub struct SessionClient {
    directory: SessionDirectory,
    channel: InteractionChannel,
    membership: Option<Membership>,
}

impl SessionClient {
    /// Creates an unjoined client over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            directory: SessionDirectory::new(Arc::clone(&store)),
            channel: InteractionChannel::new(store),
            membership: None,
        }
    }

    /// Joins `session`, leaving any session joined before.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Connection` if the store is unreachable; the
    /// client is then unjoined.
    pub fn join(&mut self, session: SessionId, display_name: &str, role: DeviceRole) -> SessionResult<&Membership> {
        self.release();
        let membership = self.directory.create_or_join(&session, display_name, role)?;
        Ok(self.membership.insert(membership))
    }

    /// Leaves the joined session. No-op if not joined.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Connection` if the store is unreachable; the
    /// client is unjoined either way.
    pub fn leave(&mut self) -> SessionResult<()> {
        match self.membership.take() {
            Some(m) => self.directory.leave(&m.session, m.participant_id()),
            None => Ok(()),
        }
    }

    /// Best-effort leave used by `join` and `Drop`.
    fn release(&mut self) {
        if let Err(err) = self.leave() {
            tracing::warn!("leaving session failed, participant record may linger: {}", err);
        }
    }

    /// Current membership, if joined.
    #[inline]
    #[must_use]
    pub fn membership(&self) -> Option<&Membership> {
        self.membership.as_ref()
    }

    /// Joined session id, if joined.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        self.membership.as_ref().map(|m| &m.session)
    }

    fn require_membership(&self, action: &str) -> SessionResult<&Membership> {
        self.membership.as_ref().ok_or_else(|| SessionError::NotJoined {
            action: action.to_owned(),
        })
    }

    /// Subscribes `listener` to the joined session.
    ///
    /// # Errors
    ///
    /// `SessionError::NotJoined` before a join, `SessionError::Connection`
    /// if the store is unreachable.
    pub fn subscribe<F>(&self, listener: F) -> SessionResult<Subscription>
    where
        F: FnMut(&InteractionRecord) + Send + 'static,
    {
        let membership = self.require_membership("subscribe")?;
        self.channel.subscribe(&membership.session, listener)
    }

    /// Subscribes a queue to the joined session.
    ///
    /// # Errors
    ///
    /// As [`SessionClient::subscribe`].
    pub fn subscribe_queue(&self) -> SessionResult<(Subscription, Receiver<InteractionRecord>)> {
        let membership = self.require_membership("subscribe")?;
        self.channel.subscribe_queue(&membership.session)
    }

    /// Participants of the joined session.
    ///
    /// # Errors
    ///
    /// As [`SessionClient::subscribe`].
    pub fn participants(&self) -> SessionResult<Vec<ParticipantRecord>> {
        let membership = self.require_membership("participants")?;
        self.directory.participants(&membership.session)
    }
}

impl InteractionSink for SessionClient {
    fn send(&self, action: Action) -> SessionResult<InteractionId> {
        let membership = self.require_membership(action.kind())?;
        self.directory.append(membership, action)
    }
}

impl Drop for SessionClient {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[test]
    fn test_send_before_join_is_not_joined() {
        let client = SessionClient::new(Arc::new(InMemoryStore::default()));
        let err = client.send(Action::RacingTap).unwrap_err();
        assert_eq!(err, SessionError::NotJoined { action: "racing-tap".into() });
        assert!(client.subscribe_queue().is_err());
    }

    #[test]
    fn test_drop_leaves_session() {
        let store = Arc::new(InMemoryStore::default());
        let session = SessionId::new("s");
        {
            let mut client = SessionClient::new(store.clone());
            client.join(session.clone(), "ana", DeviceRole::Controller).unwrap();
            assert_eq!(store.participants(&session).unwrap().len(), 1);
        }
        assert!(store.participants(&session).unwrap().is_empty());
    }

    #[test]
    fn test_drop_with_unreachable_store_does_not_panic() {
        let store = Arc::new(InMemoryStore::default());
        let session = SessionId::new("s");
        let mut client = SessionClient::new(store.clone());
        client.join(session.clone(), "ana", DeviceRole::Controller).unwrap();
        store.set_reachable(false);
        drop(client);
        store.set_reachable(true);
        // Orphaned record is an accepted outcome of a failed teardown.
        assert_eq!(store.participants(&session).unwrap().len(), 1);
    }

    #[test]
    fn test_rejoin_leaves_previous_session() {
        let store = Arc::new(InMemoryStore::default());
        let first = SessionId::new("a");
        let second = SessionId::new("b");
        let mut client = SessionClient::new(store.clone());
        client.join(first.clone(), "ana", DeviceRole::Controller).unwrap();
        client.join(second.clone(), "ana", DeviceRole::Controller).unwrap();
        assert!(store.participants(&first).unwrap().is_empty());
        assert_eq!(store.participants(&second).unwrap().len(), 1);
        assert_eq!(client.session_id(), Some(&second));
    }

    #[test]
    fn test_send_after_join() {
        let store = Arc::new(InMemoryStore::default());
        let session = SessionId::new("s");
        let mut client = SessionClient::new(store.clone());
        client.join(session.clone(), "ana", DeviceRole::Controller).unwrap();
        client.send(Action::RacingLaneSwitch { lane: 0 }).unwrap();
        let log = store.interactions(&session).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].player_name, "ana");
    }
}
