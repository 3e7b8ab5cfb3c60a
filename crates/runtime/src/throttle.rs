use lazytree_core::flatten::Viewport;
use std::time::{Duration, Instant};

/// Leading edge throttle for viewport changes.
///
/// The first change inside a window fires immediately. Later changes in the
/// same window are coalesced; only the most recent one is kept and handed out
/// by [`ScrollThrottle::release`] once the window has elapsed.
#[derive(Clone, Debug)]
pub struct ScrollThrottle {
    window: Duration,
    last_fire: Option<Instant>,
    trailing: Option<Viewport>,
}

impl ScrollThrottle {
    pub fn new(window: Duration) -> Self {
        Self { window, last_fire: None, trailing: None }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Viewport waiting for the window to elapse.
    pub fn trailing(&self) -> Option<Viewport> {
        self.trailing
    }

    /// Returns `true` if `viewport` should be handled right away.
    pub fn admit(&mut self, viewport: Viewport, now: Instant) -> bool {
        if self.is_open(now) {
            self.fire(now);
            true
        } else {
            self.trailing = Some(viewport);
            false
        }
    }

    /// Hands out the coalesced viewport once the window is over.
    pub fn release(&mut self, now: Instant) -> Option<Viewport> {
        if self.trailing.is_none() || !self.is_open(now) {
            return None;
        }
        let viewport = self.trailing.take();
        self.fire(now);
        viewport
    }

    fn is_open(&self, now: Instant) -> bool {
        self.last_fire.is_none_or(|last| now.saturating_duration_since(last) >= self.window)
    }

    fn fire(&mut self, now: Instant) {
        self.last_fire = Some(now);
        self.trailing = None;
    }
}
