//! Semantic validation of settings and secrets.

use std::collections::HashSet;
use thiserror::Error;

use crate::secrets::Secrets;
use crate::settings::UpdaterSettings;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Duplicate credentials for exchange {0}")]
    DuplicateExchange(String),
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::MissingField(_) => 64,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::DuplicateExchange(_) => 67,
        }
    }
}

/// Validate updater settings.
///
/// Service commands may be empty in test mode because they are never run.
pub fn validate_settings(settings: &UpdaterSettings, test_mode: bool) -> ValidationResult<()> {
    require_file_name("gunbot.config", &settings.gunbot.config)?;
    require_file_name("gui.config", &settings.gui.config)?;

    if settings.gunbot.config == settings.gui.config {
        return Err(ValidationError::InvalidValue {
            field: "gui.config".to_string(),
            message: "must differ from gunbot.config".to_string(),
        });
    }

    // Services are only restarted after a GUI update.
    if !test_mode && settings.gui.enabled {
        require_non_empty("gunbot.start", &settings.gunbot.start)?;
        require_non_empty("gunbot.stop", &settings.gunbot.stop)?;
        require_non_empty("gui.start", &settings.gui.start)?;
        require_non_empty("gui.stop", &settings.gui.stop)?;
    }

    if settings.http.timeout_secs == 0 {
        return Err(ValidationError::InvalidValue {
            field: "http.timeoutSecs".to_string(),
            message: "must be positive".to_string(),
        });
    }

    Ok(())
}

/// Validate the secrets file.
pub fn validate_secrets(secrets: &Secrets) -> ValidationResult<()> {
    let mut seen = HashSet::new();
    for secret in &secrets.exchanges {
        require_non_empty("exchanges[].exchange", &secret.exchange)?;
        if !seen.insert(secret.exchange.as_str()) {
            return Err(ValidationError::DuplicateExchange(secret.exchange.clone()));
        }
    }
    Ok(())
}

fn require_non_empty(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field.to_string()));
    }
    Ok(())
}

fn require_file_name(field: &str, value: &str) -> ValidationResult<()> {
    require_non_empty(field, value)?;
    if value.contains('/') || value.contains('\\') {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("expected a file name, got path {:?}", value),
        });
    }
    Ok(())
}
