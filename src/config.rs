// src/config.rs

//! Configuration loading utilities.
//!
//! Convenience functions that assemble the runtime configuration and the
//! source list the way the binary needs them.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::{Config, Source};

/// Validated configuration, plus the reason the file was skipped when it
/// could not be loaded.
#[derive(Debug)]
pub struct Settings {
    pub config: Config,
    pub file_error: Option<AppError>,
}

impl Settings {
    /// Warn about a skipped configuration file. Call once logging is up.
    pub fn log_fallback(&self, path: Option<&Path>) {
        if let (Some(e), Some(path)) = (&self.file_error, path) {
            log::warn!(
                "Config load failed from {}: {}. Using defaults.",
                path.display(),
                e
            );
        }
    }
}

/// Load configuration from an optional TOML file, overlay the environment
/// and validate the result.
///
/// A file that cannot be read falls back to defaults; the error is kept in
/// [`Settings::file_error`] so it can be reported after logging starts.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

/// [`load_settings`] with an explicit environment lookup.
pub fn load_settings_with(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Settings> {
    let (mut config, file_error) = match path.map(Config::load) {
        Some(Ok(config)) => (config, None),
        Some(Err(e)) => (Config::default(), Some(e)),
        None => (Config::default(), None),
    };
    config.apply_env_with(lookup);
    config
        .validate()
        .map_err(|e| AppError::config(format!("Invalid configuration: {e}")))?;
    Ok(Settings { config, file_error })
}

/// Load the configured source list. Any problem with it is fatal.
pub fn load_sources(config: &Config) -> Result<Vec<Source>> {
    Source::load_all(&config.sources_file).map_err(|e| {
        AppError::config(format!(
            "Failed to load sources from {}: {e}",
            config.sources_file.display()
        ))
    })
}
