//! Fixed-window admission control keyed by client identifier.
//!
//! Each identifier owns one [`ClientWindow`].  The first call (or the first
//! call after the window has elapsed) opens a fresh window with `count = 1`;
//! every later call in the same window increments the count and is admitted
//! while the count stays within capacity.
//!
//! This is a fixed window, not a sliding one: a client can land up to twice
//! the capacity in a burst that straddles a window boundary.
//!
//! ```text
//! |-------- window 1 --------|-------- window 2 --------|
//!                  30 calls ^ ^ 30 calls
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::config::LimitsConfig;

// ---------------------------------------------------------------------------
// ClientWindow
// ---------------------------------------------------------------------------

/// Counting state for one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientWindow {
    /// When the current window opened.
    pub window_start: Instant,
    /// Calls seen in the current window, including denied ones.
    pub count: u32,
}

// ---------------------------------------------------------------------------
// Admission
// ---------------------------------------------------------------------------

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// Denied until the current window closes.
    Denied { retry_after: Duration },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

// ---------------------------------------------------------------------------
// RateLimiter
// ---------------------------------------------------------------------------

/// Process-wide fixed-window limiter.
///
/// Construct once and share behind an `Arc`.  The whole map sits behind one
/// mutex, so increment-and-compare is atomic for concurrent callers of the
/// same identifier.  The lock is only held for map bookkeeping and never
/// across an `.await`.
///
/// ```rust
/// use std::time::Duration;
/// use dentavoice_relay::limiter::RateLimiter;
///
/// let limiter = RateLimiter::new(Duration::from_secs(600), 2);
/// assert!(limiter.allow("10.0.0.1"));
/// assert!(limiter.allow("10.0.0.1"));
/// assert!(!limiter.allow("10.0.0.1"));
/// assert!(limiter.allow("10.0.0.2"));
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, ClientWindow>>,
    window: Duration,
    capacity: u32,
}

impl RateLimiter {
    pub fn new(window: Duration, capacity: u32) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            window,
            capacity,
        }
    }

    pub fn from_config(config: &LimitsConfig) -> Self {
        Self::new(config.window(), config.capacity)
    }

    /// `true` when the call is admitted.
    pub fn allow(&self, identifier: &str) -> bool {
        self.check(identifier).is_admitted()
    }

    pub fn check(&self, identifier: &str) -> Admission {
        self.check_at(identifier, Instant::now())
    }

    /// Record one call from `identifier` at `now` and decide admission.
    pub fn check_at(&self, identifier: &str, now: Instant) -> Admission {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        match windows.get_mut(identifier) {
            Some(entry) if now.saturating_duration_since(entry.window_start) <= self.window => {
                entry.count = entry.count.saturating_add(1);
                if entry.count <= self.capacity {
                    Admission::Admitted
                } else {
                    let elapsed = now.saturating_duration_since(entry.window_start);
                    Admission::Denied {
                        retry_after: self.window.saturating_sub(elapsed),
                    }
                }
            }
            _ => {
                windows.insert(
                    identifier.to_string(),
                    ClientWindow {
                        window_start: now,
                        count: 1,
                    },
                );
                if self.capacity >= 1 {
                    Admission::Admitted
                } else {
                    Admission::Denied {
                        retry_after: self.window,
                    }
                }
            }
        }
    }

    /// Drop every window that has already elapsed at `now`.
    ///
    /// An elapsed window would be replaced on the identifier's next call
    /// anyway, so eviction never changes an admission decision; it only
    /// bounds memory.  Returns the number of entries removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let before = windows.len();
        windows.retain(|_, w| now.saturating_duration_since(w.window_start) <= self.window);
        before - windows.len()
    }

    /// Snapshot of one identifier's window.
    pub fn window_of(&self, identifier: &str) -> Option<ClientWindow> {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identifier)
            .copied()
    }

    /// Number of tracked identifiers.
    pub fn len(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
