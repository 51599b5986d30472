//! Relay entry point.
//!
//! # Startup sequence
//!
//! 1. Initialise logging (`RUST_LOG`, default `info`).
//! 2. Load [`RelayConfig`] from `relay.toml` plus environment (defaults when
//!    the file is absent).
//! 3. Report whether the upstream credential is present.  The key itself
//!    is never logged.
//! 4. Serve until Ctrl-C.

use dentavoice_relay::config::{RelayConfig, RelayPaths, API_KEY_ENV};
use dentavoice_relay::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("DentaVoice relay starting up");

    // 2. Configuration
    let paths = RelayPaths::new();
    let config = RelayConfig::load().unwrap_or_else(|e| {
        log::warn!(
            "Failed to load {} ({e}); using defaults",
            paths.settings_file.display()
        );
        let mut config = RelayConfig::default();
        config.apply_env();
        config
    });

    // 3. Credential presence
    if config.upstream.api_key.is_some() {
        log::info!("upstream credential loaded from {API_KEY_ENV}");
    } else {
        log::warn!("{API_KEY_ENV} is not set; every relay request will answer 500");
    }

    // 4. Serve
    server::serve(config).await
}
