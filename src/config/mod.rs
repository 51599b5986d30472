//! Configuration module for the DentaVoice relay.
//!
//! Provides `RelayConfig` (top-level settings), one sub-config per
//! subsystem, `RelayPaths` for locating `relay.toml`, and TOML persistence via
//! `RelayConfig::load` / `RelayConfig::save_to`.

pub mod paths;
pub mod settings;

pub use paths::{RelayPaths, CONFIG_PATH_ENV};
pub use settings::{
    LimitsConfig, RelayConfig, ServerConfig, TokenConfig, UpstreamConfig, API_KEY_ENV,
};
