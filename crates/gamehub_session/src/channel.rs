//! # Interaction Channel
//!
//! Publish/subscribe over a session's interaction log with exactly-once
//! delivery per listener.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐ notice ┌──────────────────┐  unseen, in log order  ┌──────────┐
//! │ SessionStore│───────>│ Subscription     │───────────────────────>│ listener │
//! │  (log)      │<───────│  seen: {ids}     │                        └──────────┘
//! └─────────────┘snapshot└──────────────────┘
//! ```
//!
//! The subscription owns a seen-set keyed by interaction id. Whatever the
//! store redelivers, a listener sees each id once. When the watch channel
//! disconnects the subscription re-registers and replays only unseen entries.
//!
//! The log is append-only, so a pump reads only past a cursor of entries
//! already read. A resubscribe rewinds the cursor and re-reads the whole log;
//! the seen-set filters what was delivered before the drop.
//!
//! Delivery is cooperative: nothing reaches the listener until the owner
//! calls [`Subscription::pump`].

use std::collections::HashSet;
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, TryRecvError};
use gamehub_shared::{InteractionId, InteractionRecord, SessionId};

use crate::error::{SessionError, SessionResult};
use crate::store::{SessionStore, StoreNotice};

/// Callback invoked once per unseen interaction.
pub type InteractionListener = Box<dyn FnMut(&InteractionRecord) + Send>;

/// Delivery counters for one subscription.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    /// Interactions handed to the listener.
    pub delivered: u64,
    /// Re-read entries skipped because they were already seen.
    pub skipped: u64,
    /// Times the watch was re-established.
    pub resubscribes: u64,
}

/// Subscribes listeners to session logs.
#[derive(Clone)]
pub struct InteractionChannel {
    store: Arc<dyn SessionStore>,
}

impl InteractionChannel {
    /// Creates a channel over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Registers `listener` on `session`.
    ///
    /// The first [`Subscription::pump`] delivers every interaction already in
    /// the log; later pumps deliver what was appended since.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Connection` if the store is unreachable.
    pub fn subscribe<F>(&self, session: &SessionId, listener: F) -> SessionResult<Subscription>
    where
        F: FnMut(&InteractionRecord) + Send + 'static,
    {
        let receiver = self.store.watch(session)?;
        tracing::info!(session = %session, "subscribed to interactions");
        Ok(Subscription {
            session: session.clone(),
            store: Arc::clone(&self.store),
            receiver: Some(receiver),
            listener: Box::new(listener),
            seen: HashSet::new(),
            cursor: 0,
            needs_sync: true,
            active: true,
            stats: DeliveryStats::default(),
        })
    }

    /// Subscribes with a queue as the listener.
    ///
    /// Pumping the subscription fills the returned receiver, which the owner
    /// drains at its own pace.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Connection` if the store is unreachable.
    pub fn subscribe_queue(
        &self,
        session: &SessionId,
    ) -> SessionResult<(Subscription, Receiver<InteractionRecord>)> {
        let (tx, rx) = unbounded();
        let subscription = self.subscribe(session, move |record| {
            // Receiver gone means the owner stopped listening.
            let _ = tx.send(record.clone());
        })?;
        Ok((subscription, rx))
    }
}

/// A live registration. Unsubscribes on drop.
pub struct Subscription {
    session: SessionId,
    store: Arc<dyn SessionStore>,
    receiver: Option<Receiver<StoreNotice>>,
    listener: InteractionListener,
    seen: HashSet<InteractionId>,
    /// Log entries already read.
    cursor: usize,
    needs_sync: bool,
    active: bool,
    stats: DeliveryStats,
}

impl Subscription {
    /// Delivers every pending unseen interaction, in log order.
    ///
    /// Returns the number delivered. After a failed pump the next one retries
    /// the resubscribe and the log read.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ChannelClosed` after [`Subscription::unsubscribe`],
    /// or `SessionError::Connection` if the store is unreachable.
    pub fn pump(&mut self) -> SessionResult<usize> {
        if !self.active {
            return Err(SessionError::ChannelClosed);
        }

        self.drain_notices();
        self.resubscribe()?;
        if !self.needs_sync {
            return Ok(0);
        }

        let fresh = self.store.interactions_since(&self.session, self.cursor)?;
        self.needs_sync = false;
        self.cursor += fresh.len();

        let mut delivered = 0;
        for record in &fresh {
            if self.seen.insert(record.id.clone()) {
                (self.listener)(record);
                delivered += 1;
            } else {
                self.stats.skipped += 1;
            }
        }
        self.stats.delivered += delivered as u64;
        if delivered > 0 {
            tracing::trace!(session = %self.session, "delivered {} interaction(s)", delivered);
        }
        Ok(delivered)
    }

    /// Drains queued notices, forgetting the watch if it disconnected.
    fn drain_notices(&mut self) {
        let Some(receiver) = &self.receiver else {
            return;
        };
        loop {
            match receiver.try_recv() {
                Ok(_) => self.needs_sync = true,
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!(session = %self.session, "interaction watch dropped, resubscribing");
                    self.receiver = None;
                    return;
                }
            }
        }
    }

    /// Re-registers the watch if it is gone.
    fn resubscribe(&mut self) -> SessionResult<()> {
        if self.receiver.is_some() {
            return Ok(());
        }
        self.receiver = Some(self.store.watch(&self.session)?);
        self.cursor = 0;
        self.needs_sync = true;
        self.stats.resubscribes += 1;
        Ok(())
    }

    /// Stops delivery. Already-delivered interactions are not retracted.
    pub fn unsubscribe(&mut self) {
        if self.active {
            self.active = false;
            self.receiver = None;
            tracing::info!(session = %self.session, "unsubscribed from interactions");
        }
    }

    /// Returns whether the subscription still delivers.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Number of distinct interactions this listener has seen.
    #[inline]
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Delivery counters.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> DeliveryStats {
        self.stats
    }

    /// The subscribed session.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &SessionId {
        &self.session
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
