//! `CompletionClient` trait and the HTTPS implementation.
//!
//! [`AnthropicClient`] posts an assembled [`PromptPayload`] to the Messages
//! API with the service credential.  One attempt per request: failures are
//! returned to the caller as-is, never retried.  The response body is read
//! incrementally and abandoned once it passes `max_response_bytes`.

use async_trait::async_trait;

use crate::config::UpstreamConfig;
use crate::prompt::PromptPayload;

use super::response::{classify_response, UpstreamError, UpstreamResult};

// ---------------------------------------------------------------------------
// CompletionClient trait
// ---------------------------------------------------------------------------

/// The relay's view of the completion API.
///
/// Implementors must be `Send + Sync` so they can be shared across request
/// tasks as `Arc<dyn CompletionClient>`.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// `false` when no credential is available; requests must not be sent.
    fn is_configured(&self) -> bool;

    async fn send(&self, payload: &PromptPayload) -> Result<UpstreamResult, UpstreamError>;
}

// ---------------------------------------------------------------------------
// AnthropicClient
// ---------------------------------------------------------------------------

pub struct AnthropicClient {
    client: reqwest::Client,
    config: UpstreamConfig,
}

impl AnthropicClient {
    /// Build from config.
    ///
    /// The HTTP client carries the whole-request timeout from
    /// `config.timeout_secs`.
    pub fn from_config(config: &UpstreamConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_else(|e| {
                log::warn!("falling back to default HTTP client: {e}");
                reqwest::Client::new()
            });

        Self {
            client,
            config: config.clone(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    fn is_configured(&self) -> bool {
        self.config.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    async fn send(&self, payload: &PromptPayload) -> Result<UpstreamResult, UpstreamError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(UpstreamError::MissingCredential)?;

        log::debug!(
            "upstream call: model={} max_tokens={} system_blocks={} turns={}",
            payload.model(),
            payload.max_tokens(),
            payload.system().len(),
            payload.messages().len()
        );

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", key)
            .header("anthropic-version", &self.config.api_version)
            .json(&payload.to_request_body())
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = read_bounded(response, self.config.max_response_bytes).await?;

        classify_response(status, &body)
    }
}

/// Buffer the body, failing once it exceeds `limit` bytes.
async fn read_bounded(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, UpstreamError> {
    if response
        .content_length()
        .is_some_and(|len| len > limit as u64)
    {
        return Err(UpstreamError::TooLarge(limit));
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > limit {
            return Err(UpstreamError::TooLarge(limit));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{SystemBlock, Turn};
    use crate::request::Role;

    fn make_config(api_key: Option<&str>) -> UpstreamConfig {
        UpstreamConfig {
            api_key: api_key.map(|s| s.to_string()),
            ..UpstreamConfig::default()
        }
    }

    #[test]
    fn from_config_builds_without_panic() {
        let _client = AnthropicClient::from_config(&make_config(None));
    }

    #[test]
    fn configured_only_with_non_empty_key() {
        assert!(!AnthropicClient::from_config(&make_config(None)).is_configured());
        assert!(!AnthropicClient::from_config(&make_config(Some(""))).is_configured());
        assert!(AnthropicClient::from_config(&make_config(Some("sk-ant-1"))).is_configured());
    }

    #[test]
    fn messages_url_tolerates_trailing_slash() {
        let mut config = make_config(None);
        config.base_url = "http://localhost:9999/".into();
        let client = AnthropicClient::from_config(&config);
        assert_eq!(client.messages_url(), "http://localhost:9999/v1/messages");
    }

    #[tokio::test]
    async fn send_without_credential_never_calls_out() {
        let client = AnthropicClient::from_config(&make_config(None));
        let payload = PromptPayload::new(
            "m",
            10,
            vec![SystemBlock::cached("s")],
            vec![Turn::text(Role::User, "hi")],
        );
        assert_eq!(
            client.send(&payload).await.unwrap_err(),
            UpstreamError::MissingCredential
        );
    }

    /// `AnthropicClient` must be usable as `dyn CompletionClient`.
    #[test]
    fn client_is_object_safe() {
        let client: Box<dyn CompletionClient> =
            Box::new(AnthropicClient::from_config(&make_config(None)));
        drop(client);
    }
}
