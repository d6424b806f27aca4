//! Push-fed snapshot caches
//!
//! The printer only ever delivers status and attributes as pushes, so each
//! cache keeps the last snapshot and lets any number of waiters subscribe to
//! the next one. A subscription taken before a refresh is issued cannot miss
//! the push that answers it.

use tokio::sync::watch;

/// Last pushed value of `T` plus "wait for the next one"
pub struct StateCache<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone + Default> StateCache<T> {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(T::default());
        Self { tx }
    }
}

impl<T: Clone + Default> Default for StateCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> StateCache<T> {
    /// The last pushed snapshot, never blocks
    pub fn current(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Replace the snapshot and wake every subscriber
    pub fn publish(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Subscribe to snapshots published after this call
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Number of live subscriptions
    pub fn waiters(&self) -> usize {
        self.tx.receiver_count()
    }
}
