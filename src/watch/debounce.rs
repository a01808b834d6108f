// src/watch/debounce.rs

use std::time::{Duration, Instant};

/// Suppresses reload triggers that arrive within `threshold` of the last
/// accepted one.
///
/// Owned by the single event consumer, so `accept` takes `&mut self` and no
/// locking is involved.
#[derive(Debug, Clone)]
pub struct Debouncer {
    threshold: Duration,
    last_accepted: Option<Instant>,
}

impl Debouncer {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            last_accepted: None,
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Accept the event at `now` unless it falls inside the window of the
    /// previously accepted one. Only accepted events move the window.
    pub fn accept(&mut self, now: Instant) -> bool {
        let accepted = match self.last_accepted {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.threshold,
        };
        if accepted {
            self.last_accepted = Some(now);
        }
        accepted
    }
}
