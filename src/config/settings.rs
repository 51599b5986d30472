//! Relay settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Every section is `#[serde(default)]`, so a partial `relay.toml` only needs
//! the keys an operator wants to change.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::RelayPaths;

/// Environment variable carrying the upstream API credential.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// Inbound HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the relay listens on.
    pub bind_addr: String,
    /// Largest accepted request body in bytes.  Must leave room for a
    /// 14,000,000-character base64 image plus the JSON envelope.
    pub max_request_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8787".into(),
            max_request_bytes: 16 * 1024 * 1024,
        }
    }
}

// ---------------------------------------------------------------------------
// UpstreamConfig
// ---------------------------------------------------------------------------

/// Settings for the completion API the relay forwards to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the API (the `/v1/messages` path is appended).
    pub base_url: String,
    /// Value sent in the `anthropic-version` header.
    pub api_version: String,
    /// Model identifier placed in every assembled payload.
    pub model: String,
    /// Maximum seconds to wait for the upstream before failing the request.
    pub timeout_secs: u64,
    /// Upper bound on the upstream response body that will be buffered.
    pub max_response_bytes: usize,
    /// Service credential.  Never persisted; injected from
    /// [`API_KEY_ENV`] by [`RelayConfig::apply_env`].
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".into(),
            api_version: "2023-06-01".into(),
            model: "claude-haiku-4-5-20251001".into(),
            timeout_secs: 60,
            max_response_bytes: 2 * 1024 * 1024,
            api_key: None,
        }
    }
}

impl UpstreamConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// LimitsConfig
// ---------------------------------------------------------------------------

/// Fixed-window rate limiter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Length of one counting window in seconds.
    pub window_secs: u64,
    /// Admitted calls per identifier per window.
    pub capacity: u32,
    /// How often stale windows are evicted, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            window_secs: 600,
            capacity: 30,
            sweep_interval_secs: 300,
        }
    }
}

impl LimitsConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

// ---------------------------------------------------------------------------
// TokenConfig
// ---------------------------------------------------------------------------

/// Output token ceilings per mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// SOAP note + recommendations.
    pub structure_max_tokens: u32,
    /// Document text extraction.
    pub ocr_max_tokens: u32,
    /// Agent replies that do not need patient data.
    pub agent_max_tokens: u32,
    /// Agent replies answered against injected patient context.
    pub agent_patient_max_tokens: u32,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            structure_max_tokens: 2000,
            ocr_max_tokens: 3000,
            agent_max_tokens: 1024,
            agent_patient_max_tokens: 2048,
        }
    }
}

// ---------------------------------------------------------------------------
// RelayConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level relay configuration, serialised as `relay.toml`.
///
/// ```rust,no_run
/// use dentavoice_relay::config::RelayConfig;
///
/// // Missing file -> defaults; credential pulled from the environment.
/// let config = RelayConfig::load().unwrap();
/// assert_eq!(config.limits.capacity, 30);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub limits: LimitsConfig,
    pub tokens: TokenConfig,
}

impl RelayConfig {
    /// Load from the platform-appropriate `relay.toml`, then apply
    /// environment overrides.
    ///
    /// Returns defaults when the file does not exist so a bare deployment
    /// only needs the credential in its environment.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&RelayPaths::new().settings_file)?;
        config.apply_env();
        Ok(config)
    }

    /// Load from an explicit path without touching the environment.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save to an explicit path, creating parent directories as needed.
    ///
    /// The credential is never written.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Pull the credential from [`API_KEY_ENV`].
    pub fn apply_env(&mut self) {
        self.set_api_key(std::env::var(API_KEY_ENV).ok());
    }

    /// Set the credential; blank values count as unset.
    pub fn set_api_key(&mut self, key: Option<String>) {
        self.upstream.api_key = key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
