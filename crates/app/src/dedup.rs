//! Event de-duplication — drop events whose id was seen recently.
//!
//! Upstream producers retry deliveries, so the same event can reach
//! `/evaluate` more than once. When a window is configured, an event id
//! seen within that window is reported as a duplicate and not evaluated
//! again. Events without an id are never de-duplicated.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// Remembers event ids for a fixed window.
#[derive(Debug)]
pub struct EventDeduplicator {
    window: Duration,
    seen: Mutex<HashMap<String, Instant>>,
}

impl EventDeduplicator {
    /// A window of zero disables de-duplication.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.window.is_zero()
    }

    /// Record `event_id` and tell whether this is its first sighting within
    /// the window.
    pub fn first_sighting(&self, event_id: &str) -> bool {
        if !self.is_enabled() || event_id.is_empty() {
            return true;
        }
        let now = Instant::now();
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.retain(|_, at| now.duration_since(*at) < self.window);
        if seen.contains_key(event_id) {
            return false;
        }
        seen.insert(event_id.to_string(), now);
        true
    }
}
