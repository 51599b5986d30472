//! Completion API access.
//!
//! * [`CompletionClient`]: async trait the dispatcher talks to.
//! * [`AnthropicClient`]: HTTPS implementation (single attempt, bounded read).
//! * [`classify_response`]: `(status, body)` → [`UpstreamResult`] / [`UpstreamError`].

pub mod client;
pub mod response;

pub use client::{AnthropicClient, CompletionClient};
pub use response::{classify_response, UpstreamError, UpstreamResult, DEFAULT_UPSTREAM_MESSAGE};
