//! The local mirror of the authority's match state and the notification
//! bus consumers subscribe to.
//!
//! The store is written only by the push transport. Consumers read
//! snapshots and get called back after every applied update, in the order
//! they subscribed. A listener that fails or panics is logged and skipped;
//! the remaining listeners still run and the stored state is unaffected.

use log::*;
use scoreboard_common::{match_state::MatchState, push::PushMessage};
use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("listener failed: {0}")]
pub struct ListenerError(#[from] Box<dyn std::error::Error + Send + Sync>);

impl ListenerError {
    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self(message.into())
    }
}

pub type ListenerResult = Result<(), ListenerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    State,
    Connection,
}

type Callback<T> = Arc<dyn Fn(&T) -> ListenerResult + Send + Sync>;

struct ListenerRegistry<T: ?Sized> {
    entries: Vec<(ListenerId, Callback<T>)>,
}

impl<T: ?Sized> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: ?Sized> ListenerRegistry<T> {
    fn add(&mut self, id: ListenerId, callback: Callback<T>) {
        self.entries.push((id, callback));
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    fn callbacks(&self) -> Vec<(ListenerId, Callback<T>)> {
        self.entries.clone()
    }
}

fn notify<T: ?Sized>(channel: Channel, callbacks: Vec<(ListenerId, Callback<T>)>, value: &T) {
    for (id, callback) in callbacks {
        match catch_unwind(AssertUnwindSafe(|| callback(value))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("{channel:?} listener {id:?} failed: {e}"),
            Err(_) => error!("{channel:?} listener {id:?} panicked"),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct StoreInner {
    state: Mutex<Arc<MatchState>>,
    connected: Mutex<bool>,
    next_id: Mutex<u64>,
    state_listeners: Mutex<ListenerRegistry<MatchState>>,
    connection_listeners: Mutex<ListenerRegistry<bool>>,
}

impl StoreInner {
    fn next_id(&self) -> ListenerId {
        let mut next = lock(&self.next_id);
        *next += 1;
        ListenerId(*next)
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        lock(&self.state_listeners).remove(id) || lock(&self.connection_listeners).remove(id)
    }
}

/// A cheap, cloneable handle to one shared store. Every clone sees the same
/// state and listeners.
#[derive(Clone, Default)]
pub struct StateStore {
    inner: Arc<StoreInner>,
}

impl core::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("StateStore")
            .field("version", &self.snapshot().version)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<MatchState> {
        lock(&self.inner.state).clone()
    }

    pub fn is_connected(&self) -> bool {
        *lock(&self.inner.connected)
    }

    /// Calls `listener` after every applied update until the returned guard
    /// is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&MatchState) -> ListenerResult + Send + Sync + 'static,
    {
        let id = self.inner.next_id();
        lock(&self.inner.state_listeners).add(id, Arc::new(listener));
        debug!("Added state listener {id:?}");
        self.subscription(id)
    }

    /// Calls `listener` on every change of connectivity. It is not called
    /// with the current value; read that with [`StateStore::is_connected`].
    pub fn subscribe_connection_status<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&bool) -> ListenerResult + Send + Sync + 'static,
    {
        let id = self.inner.next_id();
        lock(&self.inner.connection_listeners).add(id, Arc::new(listener));
        debug!("Added connection listener {id:?}");
        self.subscription(id)
    }

    /// Returns `false` if `id` was not subscribed
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.unsubscribe(id)
    }

    fn subscription(&self, id: ListenerId) -> Subscription {
        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    /// Folds a push into the state and notifies listeners with the complete
    /// result. Returns whether anything was applied.
    pub(crate) fn apply(&self, message: PushMessage) -> bool {
        let kind = message.kind();
        let updated = {
            let mut state = lock(&self.inner.state);
            let mut next = MatchState::clone(&state);
            if !next.apply(message) {
                debug!("Ignoring {kind} push with nothing to apply");
                return false;
            }
            let next = Arc::new(next);
            *state = next.clone();
            next
        };
        trace!("Applied {kind} push, now at version {}", updated.version);

        let callbacks = lock(&self.inner.state_listeners).callbacks();
        notify(Channel::State, callbacks, &*updated);
        true
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        {
            let mut current = lock(&self.inner.connected);
            if *current == connected {
                return;
            }
            *current = connected;
        }
        let callbacks = lock(&self.inner.connection_listeners).callbacks();
        notify(Channel::Connection, callbacks, &connected);
    }
}

/// Keeps a listener registered. Dropping it unsubscribes.
#[must_use = "the listener is removed when the subscription is dropped"]
pub struct Subscription {
    id: ListenerId,
    store: Weak<StoreInner>,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_tuple("Subscription").field(&self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.unsubscribe(self.id);
        }
    }
}
