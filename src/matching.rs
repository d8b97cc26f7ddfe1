//! Timestamp-ordered matching core (C7, §4.7).
//!
//! `gaze_cache`/`eyes_cache` are bounded monotonic deques; `closest`
//! destructively consumes from the left — it is a match-once buffer,
//! not a lookup table.

use crate::sample::{GazeDatum, MatchedGazeEyesScene, MatchedGazeScene, VideoFrame};
use std::collections::VecDeque;

/// A bounded, timestamp-monotone cache of `(timestamp, value)` pairs.
pub struct MatchCache<T> {
    capacity: usize,
    items: VecDeque<(f64, T)>,
}

impl<T> MatchCache<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, timestamp: f64, value: T) {
        if self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        self.items.push_back((timestamp, value));
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Implements `closest` from §4.7: pops the head; if it already
    /// overshoots `target`, returns it immediately. Otherwise keeps
    /// popping while the next element still satisfies `ts <= target`,
    /// returning the last one that did. Assumes monotonically
    /// increasing timestamps. Consumed items are discarded.
    pub fn closest(&mut self, target: f64) -> Option<T> {
        let (mut ts, mut value) = self.items.pop_front()?;
        if ts > target {
            return Some(value);
        }
        loop {
            match self.items.front() {
                Some((next_ts, _)) if *next_ts <= target => {
                    let (next_ts, next_value) = self.items.pop_front().unwrap();
                    ts = next_ts;
                    value = next_value;
                }
                _ => break,
            }
        }
        let _ = ts;
        Some(value)
    }
}

/// Owns the two match caches and produces matched tuples as scene
/// frames arrive. One instance per `StreamManager` pairing.
pub struct Matcher {
    gaze_cache: MatchCache<GazeDatum>,
    eyes_cache: MatchCache<VideoFrame>,
}

pub struct MatchOutcome {
    pub scene: Option<MatchedGazeScene>,
    pub scene_eyes: Option<MatchedGazeEyesScene>,
}

impl Matcher {
    pub fn new(capacity: usize) -> Self {
        Self {
            gaze_cache: MatchCache::new(capacity),
            eyes_cache: MatchCache::new(capacity),
        }
    }

    pub fn push_gaze(&mut self, timestamp: f64, gaze: GazeDatum) {
        self.gaze_cache.push(timestamp, gaze);
    }

    pub fn push_eyes(&mut self, timestamp: f64, frame: VideoFrame) {
        self.eyes_cache.push(timestamp, frame);
    }

    /// Match a newly arrived world (scene) frame against both caches.
    pub fn match_world_frame(&mut self, scene: VideoFrame, t_w: f64) -> MatchOutcome {
        let gaze = match self.gaze_cache.closest(t_w) {
            Some(g) => g,
            None => {
                return MatchOutcome {
                    scene: None,
                    scene_eyes: None,
                }
            }
        };
        let scene_for_eyes = scene.clone();
        let matched_scene = MatchedGazeScene {
            scene,
            gaze,
        };
        let scene_eyes = self.eyes_cache.closest(t_w).map(|eyes| MatchedGazeEyesScene {
            scene: scene_for_eyes,
            eyes,
            gaze: matched_scene.gaze,
        });
        MatchOutcome {
            scene: Some(matched_scene),
            scene_eyes,
        }
    }

    /// Clear both caches; called when the owning stream (re)starts.
    pub fn clear(&mut self) {
        self.gaze_cache.clear();
        self.eyes_cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{GazeSample, Point2};

    fn gaze(x: f32) -> GazeDatum {
        GazeDatum::Gaze(GazeSample {
            x,
            y: 0.0,
            worn: true,
            timestamp_unix_seconds: x as f64,
        })
    }

    fn frame() -> VideoFrame {
        VideoFrame {
            width: 1,
            height: 1,
            yuv: bytes::Bytes::from_static(&[0, 0, 0]),
            timestamp_unix_seconds: None,
        }
    }

    #[test]
    fn s4_matcher_picks_last_item_at_or_before_target() {
        let mut cache = MatchCache::new(200);
        cache.push(1.00, gaze(1.00));
        cache.push(1.05, gaze(1.05));
        cache.push(1.10, gaze(1.10));
        cache.push(1.20, gaze(1.20));
        let found = cache.closest(1.12).unwrap();
        assert_eq!(found.timestamp_unix_seconds(), 1.10);
    }

    #[test]
    fn s5_matcher_head_overshoot_returns_head() {
        let mut cache = MatchCache::new(200);
        cache.push(1.50, gaze(1.50));
        let found = cache.closest(1.12).unwrap();
        assert_eq!(found.timestamp_unix_seconds(), 1.50);
    }

    #[test]
    fn empty_gaze_cache_skips_both_outputs() {
        let mut matcher = Matcher::new(200);
        let outcome = matcher.match_world_frame(frame(), 1.0);
        assert!(outcome.scene.is_none());
        assert!(outcome.scene_eyes.is_none());
    }

    #[test]
    fn eyes_missing_still_publishes_gaze_scene_match() {
        let mut matcher = Matcher::new(200);
        matcher.push_gaze(0.9, gaze(0.9));
        let outcome = matcher.match_world_frame(frame(), 1.0);
        assert!(outcome.scene.is_some());
        assert!(outcome.scene_eyes.is_none());
    }

    #[test]
    fn cache_respects_capacity() {
        let mut cache = MatchCache::new(2);
        cache.push(1.0, gaze(1.0));
        cache.push(2.0, gaze(2.0));
        cache.push(3.0, gaze(3.0));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn clear_empties_both_caches() {
        let mut matcher = Matcher::new(200);
        matcher.push_gaze(1.0, gaze(1.0));
        matcher.push_eyes(1.0, frame());
        matcher.clear();
        assert!(matcher.gaze_cache.is_empty());
        assert!(matcher.eyes_cache.is_empty());
    }
}
