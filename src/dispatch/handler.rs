//! Per-request state machine.
//!
//! ```text
//! method ──► OPTIONS ──► rate limit ──► credential ──► parse ──► assemble
//!   │           │            │              │            │          │
//!  405       preflight      429            500          400        400
//!                                                                   │
//!                      upstream ──► normalize ──► 200 {result, usage}
//!                         │             │
//!                  status/502/504      500
//! ```
//!
//! Each request runs to exactly one terminal.  Rejections before the
//! upstream step never contact the completion API.

use std::sync::Arc;

use axum::http::Method;
use axum::response::{IntoResponse, Response};

use crate::config::RelayConfig;
use crate::limiter::{Admission, RateLimiter};
use crate::normalize::normalize;
use crate::prompt::PromptAssembler;
use crate::request::{InputError, RelayRequest};
use crate::upstream::{AnthropicClient, CompletionClient};

use super::error::RelayError;
use super::response::Outcome;

/// Drives one inbound call through admission, assembly, the upstream
/// round-trip and normalization.
///
/// Shared across request tasks behind an `Arc`; the only mutable state is
/// the limiter's internally synchronised map.
pub struct Dispatcher {
    limiter: Arc<RateLimiter>,
    assembler: PromptAssembler,
    upstream: Arc<dyn CompletionClient>,
}

impl Dispatcher {
    pub fn new(
        limiter: Arc<RateLimiter>,
        assembler: PromptAssembler,
        upstream: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            limiter,
            assembler,
            upstream,
        }
    }

    /// Wire the production components from config.
    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(
            Arc::new(RateLimiter::from_config(&config.limits)),
            PromptAssembler::from_config(config),
            Arc::new(AnthropicClient::from_config(&config.upstream)),
        )
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Run the state machine and render its terminal as an HTTP response.
    pub async fn handle(&self, method: &Method, client_id: &str, body: &[u8]) -> Response {
        self.handle_body(method, client_id, Ok(body)).await
    }

    /// [`handle`](Self::handle) for a body that may have failed to read.
    pub async fn handle_body(
        &self,
        method: &Method,
        client_id: &str,
        body: Result<&[u8], InputError>,
    ) -> Response {
        match self.dispatch_body(method, client_id, body).await {
            Ok(outcome) => outcome.into_response(),
            Err(err) => err.into_response(),
        }
    }

    /// Run the state machine, returning the typed terminal.
    pub async fn dispatch(
        &self,
        method: &Method,
        client_id: &str,
        body: &[u8],
    ) -> Result<Outcome, RelayError> {
        self.dispatch_body(method, client_id, Ok(body)).await
    }

    /// Run the state machine over a body read result.  A read failure
    /// surfaces at the parse step, after admission and the credential check.
    pub async fn dispatch_body(
        &self,
        method: &Method,
        client_id: &str,
        body: Result<&[u8], InputError>,
    ) -> Result<Outcome, RelayError> {
        if *method == Method::OPTIONS {
            return Ok(Outcome::Preflight);
        }
        if *method != Method::POST {
            log::debug!("rejecting {method} from {client_id}");
            return Err(RelayError::MethodNotAllowed);
        }

        if let Admission::Denied { retry_after } = self.limiter.check(client_id) {
            log::warn!(
                "rate limit hit for {client_id} (retry in {}s)",
                retry_after.as_secs()
            );
            return Err(RelayError::RateLimited { retry_after });
        }

        if !self.upstream.is_configured() {
            log::error!("upstream credential missing; set the API key in the relay environment");
            return Err(RelayError::NotConfigured);
        }

        let request = body.and_then(RelayRequest::from_body).inspect_err(|e| {
            log::info!("bad request from {client_id}: {e}");
        })?;
        let mode = request.mode();

        let payload = self.assembler.assemble(request).inspect_err(|e| {
            log::info!("{mode} request from {client_id} rejected: {e}");
        })?;

        let reply = self.upstream.send(&payload).await.map_err(|e| {
            log::warn!("{mode} upstream call failed: {e}");
            RelayError::from(e)
        })?;

        log::info!(
            "{mode} ok for {client_id}: in={} out={} cache_read={} cache_creation={}",
            reply.usage.input_tokens,
            reply.usage.output_tokens,
            reply.usage.cache_read,
            reply.usage.cache_creation
        );

        let normalized = normalize(mode, reply)?;
        Ok(Outcome::Completed(normalized))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
