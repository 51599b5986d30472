//! Upstream response classification.
//!
//! [`classify_response`] is the single place that decides whether an
//! upstream reply is usable.  It is a pure function of `(status, body)` so
//! every branch can be tested without a network.

use serde_json::Value;
use thiserror::Error;

use crate::normalize::Usage;

/// Message used when the upstream gives no error text of its own.
pub const DEFAULT_UPSTREAM_MESSAGE: &str = "AI service error";

// ---------------------------------------------------------------------------
// UpstreamResult
// ---------------------------------------------------------------------------

/// Usable upstream reply: concatenated text blocks plus token usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResult {
    pub raw_text: String,
    pub usage: Usage,
}

// ---------------------------------------------------------------------------
// UpstreamError
// ---------------------------------------------------------------------------

/// Failures talking to the completion API.  None of them are retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// No credential configured; the call was never attempted.
    #[error("upstream credential is not configured")]
    MissingCredential,

    /// Transport or connection failure.  The underlying detail is logged,
    /// never returned to the caller.
    #[error("AI service request failed.")]
    Request,

    /// The call did not finish within the configured timeout.
    #[error("AI service timed out. Please try again.")]
    Timeout,

    /// Upstream reported an error, either as a non-success status or as an
    /// `error` field in a success body.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// A success status whose body is not JSON.
    #[error("AI service returned an unreadable response.")]
    Unreadable,

    /// Body exceeded the configured read bound.
    #[error("AI service response exceeded {0} bytes.")]
    TooLarge(usize),

    /// Well-formed reply with no text content.
    #[error("AI service returned an empty response.")]
    EmptyResponse,
}

impl UpstreamError {
    /// HTTP status the relay answers with for this failure.
    ///
    /// Upstream-reported statuses pass through; relay-side classification
    /// of a bad gateway uses 502, timeouts 504.
    pub fn status(&self) -> u16 {
        match self {
            UpstreamError::MissingCredential => 500,
            UpstreamError::Api { status, .. } => *status,
            UpstreamError::Timeout => 504,
            UpstreamError::Request
            | UpstreamError::Unreadable
            | UpstreamError::TooLarge(_)
            | UpstreamError::EmptyResponse => 502,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Timeout
        } else {
            log::warn!("upstream transport error: {e}");
            UpstreamError::Request
        }
    }
}

// ---------------------------------------------------------------------------
// classify_response
// ---------------------------------------------------------------------------

/// Turn a raw `(status, body)` pair into a result or a classified error.
pub fn classify_response(status: u16, body: &[u8]) -> Result<UpstreamResult, UpstreamError> {
    let success = (200..300).contains(&status);

    let Ok(json) = serde_json::from_slice::<Value>(body) else {
        return Err(if success {
            UpstreamError::Unreadable
        } else {
            UpstreamError::Api {
                status,
                message: DEFAULT_UPSTREAM_MESSAGE.to_string(),
            }
        });
    };

    if let Some(error) = json.get("error").filter(|e| !e.is_null()) {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| error.as_str())
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_UPSTREAM_MESSAGE)
            .to_string();
        return Err(UpstreamError::Api { status, message });
    }

    if !success {
        return Err(UpstreamError::Api {
            status,
            message: DEFAULT_UPSTREAM_MESSAGE.to_string(),
        });
    }

    let raw_text: String = json
        .get("content")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b.get("type").and_then(Value::as_str).unwrap_or("text") == "text")
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if raw_text.trim().is_empty() {
        return Err(UpstreamError::EmptyResponse);
    }

    let usage = json
        .get("usage")
        .cloned()
        .and_then(|u| serde_json::from_value::<Usage>(u).ok())
        .unwrap_or_default();

    Ok(UpstreamResult { raw_text, usage })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
