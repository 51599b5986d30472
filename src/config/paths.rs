//! Cross-platform config file location using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir:
//!   Windows: %APPDATA%\dentavoice-relay\
//!   macOS:   ~/Library/Application Support/dentavoice-relay/
//!   Linux:   ~/.config/dentavoice-relay/
//!
//! The `DENTAVOICE_RELAY_CONFIG` environment variable overrides the settings
//! file path entirely (useful for containers).

use std::path::PathBuf;

/// Environment variable that points at an explicit `relay.toml`.
pub const CONFIG_PATH_ENV: &str = "DENTAVOICE_RELAY_CONFIG";

/// Holds all resolved relay file paths.
#[derive(Debug, Clone)]
pub struct RelayPaths {
    /// Directory that holds `relay.toml`.
    pub config_dir: PathBuf,
    /// Full path to `relay.toml`.
    pub settings_file: PathBuf,
}

impl RelayPaths {
    const APP_NAME: &'static str = "dentavoice-relay";

    /// Resolves all paths, honouring [`CONFIG_PATH_ENV`] when set.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        if let Some(explicit) = std::env::var_os(CONFIG_PATH_ENV).filter(|v| !v.is_empty()) {
            let settings_file = PathBuf::from(explicit);
            let config_dir = settings_file
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            return Self {
                config_dir,
                settings_file,
            };
        }

        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);
        let settings_file = config_dir.join("relay.toml");

        Self {
            config_dir,
            settings_file,
        }
    }
}

impl Default for RelayPaths {
    fn default() -> Self {
        Self::new()
    }
}
