// src/core/debounce.rs
//! Recency gate for (application, URL) detections
//!
//! Content-changed events fire repeatedly while a page renders, and the
//! rewrite itself produces more events for the same field. The gate lets a
//! given pair through at most once per window.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tracing::trace;

/// Default suppression window
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(2000);

/// Default number of tracked pairs before stale entries are swept
pub const DEFAULT_MAX_TRACKED: usize = 1024;

/// Identity of a detection: which application showed which URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DetectionKey {
    pub application_id: String,
    pub url: String,
}

impl DetectionKey {
    pub fn new(application_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            url: url.into(),
        }
    }
}

impl fmt::Display for DetectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, and url {}", self.application_id, self.url)
    }
}

/// Last-trigger table keyed by [`DetectionKey`]
///
/// Stored timestamps only ever move forward: a key is re-recorded only when
/// the new timestamp is more than one window past the stored one.
#[derive(Debug, Clone)]
pub struct DebounceGate {
    window_millis: u64,
    max_tracked: usize,
    last_trigger: HashMap<DetectionKey, u64>,
}

impl DebounceGate {
    pub fn new(window: Duration) -> Self {
        Self::with_capacity(window, DEFAULT_MAX_TRACKED)
    }

    /// Gate that sweeps stale entries once more than `max_tracked` pairs are held
    pub fn with_capacity(window: Duration, max_tracked: usize) -> Self {
        Self {
            window_millis: u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
            max_tracked,
            last_trigger: HashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_millis)
    }

    /// Whether `key` would trigger at `timestamp_millis`, without recording it
    pub fn is_open(&self, key: &DetectionKey, timestamp_millis: u64) -> bool {
        match self.last_trigger.get(key) {
            Some(&last) => timestamp_millis.saturating_sub(last) > self.window_millis,
            None => true,
        }
    }

    /// Check and record in one step
    ///
    /// Returns true, and stores `timestamp_millis` as the key's last trigger,
    /// iff more than one window has passed since the key last triggered.
    pub fn should_trigger(&mut self, key: &DetectionKey, timestamp_millis: u64) -> bool {
        if !self.is_open(key, timestamp_millis) {
            trace!(%key, timestamp_millis, "detection suppressed");
            return false;
        }

        if !self.last_trigger.contains_key(key) && self.last_trigger.len() >= self.max_tracked {
            self.sweep(timestamp_millis);
        }
        self.last_trigger.insert(key.clone(), timestamp_millis);
        true
    }

    /// Drop every entry that can no longer suppress anything at `now_millis`
    ///
    /// Returns the number of entries removed.
    pub fn sweep(&mut self, now_millis: u64) -> usize {
        let before = self.last_trigger.len();
        let window = self.window_millis;
        self.last_trigger
            .retain(|_, last| now_millis.saturating_sub(*last) <= window);
        let removed = before - self.last_trigger.len();
        if removed > 0 {
            trace!(removed, remaining = self.last_trigger.len(), "swept stale detections");
        }
        removed
    }

    pub fn last_trigger(&self, key: &DetectionKey) -> Option<u64> {
        self.last_trigger.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.last_trigger.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_trigger.is_empty()
    }
}

impl Default for DebounceGate {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_WINDOW)
    }
}
