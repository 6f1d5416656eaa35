/// Coalescing of `load_more` triggers
///
/// Prefetch triggers arrive in bursts while the deck advances. The gate
/// holds a single pending request and releases it once the cooldown
/// window has elapsed, so a burst collapses into one fetch.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct LoadMoreGate {
    window: Duration,
    pending_since: Option<Instant>,
}

impl LoadMoreGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending_since: None,
        }
    }

    /// Register a trigger. Returns false if one is already pending.
    pub fn request(&mut self, now: Instant) -> bool {
        if self.pending_since.is_some() {
            return false;
        }
        self.pending_since = Some(now);
        true
    }

    /// Release the pending request if its window has elapsed
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending_since {
            Some(since) if now.saturating_duration_since(since) >= self.window => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }

    /// Drop a pending request without firing it
    pub fn cancel(&mut self) -> bool {
        self.pending_since.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }
}
