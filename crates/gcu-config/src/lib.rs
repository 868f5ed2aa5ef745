//! Gunbot config updater settings loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for `gunbot_config_updater.json` and `secrets.json`
//! - Config directory resolution (CLI → env → executable dir → cwd)
//! - Semantic validation

pub mod resolve;
pub mod secrets;
pub mod settings;
pub mod validate;

pub use resolve::{resolve_config_dir, ConfigSource};
pub use secrets::{ExchangeSecret, Secrets};
pub use settings::{GuiSection, GunbotSection, HttpSection, ResolvedSettings, UpdaterSettings};
pub use validate::{validate_secrets, validate_settings, ValidationError};

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Settings file name inside the config directory.
pub const SETTINGS_FILENAME: &str = "gunbot_config_updater.json";

/// Secrets file name inside the gunbot location.
pub const SECRETS_FILENAME: &str = "secrets.json";

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Semantic validation failed for {path}: {source}")]
    ValidationError {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration loading options, usually filled from CLI flags.
#[derive(Debug, Default, Clone)]
pub struct ConfigOptions {
    /// Explicit config directory (highest priority).
    pub config_dir: Option<PathBuf>,
    /// Overrides the settings file's `testMode`.
    pub test_mode: Option<bool>,
}

/// Load and validate the updater settings.
pub fn load_settings(options: &ConfigOptions) -> Result<ResolvedSettings, ConfigError> {
    let (config_dir, source) = resolve_config_dir(options.config_dir.as_deref());
    let path = config_dir.join(SETTINGS_FILENAME);
    let settings: UpdaterSettings = read_json(&path)?;

    let resolved = ResolvedSettings::new(settings, config_dir)
        .with_source(source)
        .with_test_mode(options.test_mode);
    validate_settings(&resolved.settings, resolved.test_mode())
        .map_err(|source| ConfigError::ValidationError { path, source })?;

    Ok(resolved)
}

/// Load and validate `secrets.json` from the gunbot location.
pub fn load_secrets(settings: &ResolvedSettings) -> Result<Secrets, ConfigError> {
    let path = settings.secrets_path();
    let secrets: Secrets = read_json(&path)?;
    validate_secrets(&secrets).map_err(|source| ConfigError::ValidationError { path, source })?;
    Ok(secrets)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}
