//! Per-client admission control.
//!
//! * [`RateLimiter`]: fixed-window counter keyed by client identifier.
//! * [`Admission`]: admit / deny-with-retry-after decision.
//! * [`ClientWindow`]: per-identifier counting state.

pub mod window;

pub use window::{Admission, ClientWindow, RateLimiter};
