//! Success and preflight terminals.

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::normalize::NormalizedResponse;

use super::error::RelayError;

/// Non-error terminal of one relay request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `OPTIONS`: CORS preflight, empty body.
    Preflight,
    /// Normalized result for the request's mode.
    Completed(NormalizedResponse),
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Outcome::Preflight => preflight_response(),
            Outcome::Completed(body) => match serde_json::to_vec(&body) {
                Ok(bytes) => json_response(StatusCode::OK, bytes),
                Err(e) => RelayError::Internal(e.to_string()).into_response(),
            },
        }
    }
}

/// JSON body with the headers every relay answer carries.  Patient data
/// must never be stored by intermediaries, hence `no-store`.
pub(crate) fn json_response(status: StatusCode, bytes: Vec<u8>) -> Response {
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn preflight_response() -> Response {
    let mut response = Response::new(Body::empty());
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    response
}
