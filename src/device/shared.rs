//! The explicit handle shared between the orchestrator and its stream
//! managers, replacing the reference implementation's `weakref.ref`
//! back-reference (§9 Design Notes): passed by value (as an `Arc`)
//! rather than held cyclically.

use crate::matching::Matcher;
use crate::sample::{EyeEventSample, GazeDatum, ImuSample, MatchedGazeEyesScene, MatchedGazeScene, VideoFrame};
use parking_lot::Mutex;
use std::sync::{Arc, Condvar};
use std::time::{Duration, Instant};

/// A single-element, consume-on-read cell doubling as the "new item"
/// signal the reference implementation tracks separately.
pub struct Mailbox<T> {
    slot: Mutex<Option<T>>,
    signal: std::sync::Mutex<()>,
    condvar: Condvar,
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
            signal: std::sync::Mutex::new(()),
            condvar: Condvar::new(),
        }
    }
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, value: T) {
        *self.slot.lock() = Some(value);
        let _guard = self.signal.lock().unwrap();
        self.condvar.notify_all();
    }

    pub fn try_take(&self) -> Option<T> {
        self.slot.lock().take()
    }

    /// Consume-or-block-with-timeout, per §4.8's `receive_*` semantics.
    /// `None` timeout blocks indefinitely; `Some(Duration::ZERO)` is a
    /// non-blocking poll.
    pub fn take_blocking(&self, timeout: Option<Duration>) -> Option<T> {
        if let Some(v) = self.try_take() {
            return Some(v);
        }
        if timeout == Some(Duration::ZERO) {
            return None;
        }
        let guard = self.signal.lock().unwrap();
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut guard = guard;
        loop {
            if let Some(v) = self.try_take() {
                return Some(v);
            }
            match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return None;
                    }
                    let (g, result) = self.condvar.wait_timeout(guard, deadline - now).unwrap();
                    guard = g;
                    if result.timed_out() && self.try_take().is_none() {
                        return None;
                    }
                }
                None => {
                    guard = self.condvar.wait(guard).unwrap();
                }
            }
        }
    }
}

#[derive(Default)]
pub struct SharedState {
    pub gaze: Mailbox<GazeDatum>,
    pub world: Mailbox<VideoFrame>,
    pub eyes: Mailbox<VideoFrame>,
    pub imu: Mailbox<ImuSample>,
    pub eye_events: Mailbox<EyeEventSample>,
    pub matched_scene: Mailbox<MatchedGazeScene>,
    pub matched_scene_eyes: Mailbox<MatchedGazeEyesScene>,
    pub matcher: Mutex<Option<Matcher>>,
    pub errors: Mutex<Vec<String>>,
}

pub type SharedHandle = Arc<SharedState>;

pub fn new_shared(match_cache_capacity: usize) -> SharedHandle {
    let state = SharedState {
        matcher: Mutex::new(Some(Matcher::new(match_cache_capacity))),
        ..Default::default()
    };
    Arc::new(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_blocking_with_zero_timeout_on_empty_slot_returns_none() {
        let mailbox: Mailbox<i32> = Mailbox::new();
        assert_eq!(mailbox.take_blocking(Some(Duration::ZERO)), None);
    }

    #[test]
    fn put_then_take_consumes_once() {
        let mailbox: Mailbox<i32> = Mailbox::new();
        mailbox.put(42);
        assert_eq!(mailbox.try_take(), Some(42));
        assert_eq!(mailbox.try_take(), None);
    }
}
