//! Thread-safe event manager bridging the synchronous caller API to the
//! worker thread's event loop (§9 Design Notes: coroutines+callbacks ->
//! one worker thread + single-slot mailboxes + boolean signals).
//!
//! Grounded on the reference `_AsyncEventManager`: per-key `Notify`,
//! `wait_for_first_event` races all keys and returns + clears the first
//! one that fires.

use std::collections::HashMap;
use std::hash::Hash;
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKey {
    ShouldWorkerClose,
    ShouldStartGaze,
    ShouldStopGaze,
    ShouldStartWorld,
    ShouldStopWorld,
    ShouldStartEyes,
    ShouldStopEyes,
    ShouldStartImu,
    ShouldStopImu,
    ShouldStartEyeEvents,
    ShouldStopEyeEvents,
}

pub struct AsyncEventManager {
    notifies: HashMap<EventKey, std::sync::Arc<Notify>>,
}

impl AsyncEventManager {
    pub fn new(keys: impl IntoIterator<Item = EventKey>) -> Self {
        let notifies = keys
            .into_iter()
            .map(|k| (k, std::sync::Arc::new(Notify::new())))
            .collect();
        Self { notifies }
    }

    /// Set the event associated with `key`. Safe to call from any thread
    /// since `Notify` itself is thread-safe; named "threadsafe" to match
    /// the reference's two-entry-point API even though there is only
    /// one implementation here.
    pub fn trigger_threadsafe(&self, key: EventKey) {
        if let Some(n) = self.notifies.get(&key) {
            n.notify_one();
        }
    }

    pub async fn wait_for_first_event(&self) -> EventKey {
        let waits: Vec<_> = self
            .notifies
            .iter()
            .map(|(key, notify)| {
                let notify = notify.clone();
                let key = *key;
                Box::pin(async move {
                    notify.notified().await;
                    key
                })
            })
            .collect();
        let (key, _idx, _rest) = futures_util::future::select_all(waits).await;
        key
    }
}
