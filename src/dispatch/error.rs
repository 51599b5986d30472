//! Relay error taxonomy and its HTTP mapping.
//!
//! | Variant            | Status              | Message                      |
//! |--------------------|---------------------|------------------------------|
//! | `MethodNotAllowed` | 405                 | fixed                        |
//! | `Input`            | 400                 | describes the defect         |
//! | `RateLimited`      | 429 + `Retry-After` | fixed                        |
//! | `NotConfigured`    | 500                 | operator-facing              |
//! | `Upstream`         | upstream's / 502 / 504 | upstream's message        |
//! | `Normalize`        | 500                 | "invalid format, try again"  |
//! | `Internal`         | 500                 | wrapped                      |

use std::time::Duration;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::normalize::NormalizeError;
use crate::request::InputError;
use crate::upstream::UpstreamError;

use super::response::json_response;

/// Every terminal failure of one relay request.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Too many requests. Please wait a few minutes.")]
    RateLimited { retry_after: Duration },

    /// The service credential is missing: a deployment fault.
    #[error("API key not configured. Set ANTHROPIC_API_KEY in the relay environment.")]
    NotConfigured,

    #[error(transparent)]
    Upstream(UpstreamError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("Server error: {0}")]
    Internal(String),
}

impl From<UpstreamError> for RelayError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::MissingCredential => RelayError::NotConfigured,
            other => RelayError::Upstream(other),
        }
    }
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::Input(_) => StatusCode::BAD_REQUEST,
            RelayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            RelayError::NotConfigured
            | RelayError::Normalize(_)
            | RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::Upstream(err) => {
                StatusCode::from_u16(err.status()).unwrap_or(StatusCode::BAD_GATEWAY)
            }
        }
    }
}

/// `{"error": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
        };
        let bytes = serde_json::to_vec(&body)
            .unwrap_or_else(|_| br#"{"error":"Server error"}"#.to_vec());

        let mut response = json_response(status, bytes);
        match &self {
            RelayError::RateLimited { retry_after } => {
                // Round up so a client never retries a fraction early.
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
            }
            RelayError::MethodNotAllowed => {
                response
                    .headers_mut()
                    .insert(header::ALLOW, HeaderValue::from_static("POST, OPTIONS"));
            }
            _ => {}
        }
        response
    }
}
