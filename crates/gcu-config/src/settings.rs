//! Typed representation of `gunbot_config_updater.json`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::resolve::ConfigSource;

/// Prefix applied to managed file names in test mode.
pub const TEST_MODE_PREFIX: &str = "test-";

/// Default HTTP timeout for fetches, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Updater settings as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdaterSettings {
    /// Write `test-` prefixed files and never run service commands.
    #[serde(default)]
    pub test_mode: bool,

    /// Keep a one-generation backup of every managed file.
    #[serde(default = "default_backup")]
    pub backup: bool,

    pub gunbot: GunbotSection,

    pub gui: GuiSection,

    #[serde(default)]
    pub http: HttpSection,
}

fn default_backup() -> bool {
    true
}

/// Where the bot lives and how to control it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GunbotSection {
    /// Install directory; empty means "same as the config directory".
    #[serde(default)]
    pub location: String,
    /// File name of the bot configuration.
    pub config: String,
    pub start: String,
    pub stop: String,
}

/// GUI front-end settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuiSection {
    /// File name of the GUI configuration.
    pub config: String,
    #[serde(default)]
    pub enabled: bool,
    /// Version string written into every GUI pair entry.
    pub gunbot_version: String,
    pub start: String,
    pub stop: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpSection {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

/// Settings bound to the directory they were loaded from, with the CLI
/// test-mode override applied.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub settings: UpdaterSettings,
    pub config_dir: PathBuf,
    config_source: ConfigSource,
    test_mode_override: Option<bool>,
}

impl ResolvedSettings {
    pub fn new(settings: UpdaterSettings, config_dir: PathBuf) -> Self {
        Self {
            settings,
            config_dir,
            config_source: ConfigSource::CliArgument,
            test_mode_override: None,
        }
    }

    /// Record how `config_dir` was found.
    pub fn with_source(mut self, source: ConfigSource) -> Self {
        self.config_source = source;
        self
    }

    pub fn config_source(&self) -> ConfigSource {
        self.config_source
    }

    /// Force test mode on or off regardless of the file.
    pub fn with_test_mode(mut self, test_mode: Option<bool>) -> Self {
        self.test_mode_override = test_mode;
        self
    }

    pub fn test_mode(&self) -> bool {
        self.test_mode_override.unwrap_or(self.settings.test_mode)
    }

    pub fn backup_enabled(&self) -> bool {
        self.settings.backup
    }

    pub fn gui_enabled(&self) -> bool {
        self.settings.gui.enabled
    }

    /// Directory holding the bot, its config files and `secrets.json`.
    pub fn gunbot_location(&self) -> PathBuf {
        if self.settings.gunbot.location.trim().is_empty() {
            self.config_dir.clone()
        } else {
            PathBuf::from(&self.settings.gunbot.location)
        }
    }

    /// Bot config file name, `test-` prefixed in test mode.
    pub fn gunbot_config_name(&self) -> String {
        self.managed_name(&self.settings.gunbot.config)
    }

    /// GUI config file name, `test-` prefixed in test mode.
    pub fn gui_config_name(&self) -> String {
        self.managed_name(&self.settings.gui.config)
    }

    pub fn gunbot_config_path(&self) -> PathBuf {
        self.gunbot_location().join(self.gunbot_config_name())
    }

    pub fn gui_config_path(&self) -> PathBuf {
        self.gunbot_location().join(self.gui_config_name())
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.gunbot_location().join(crate::SECRETS_FILENAME)
    }

    fn managed_name(&self, name: &str) -> String {
        if self.test_mode() {
            format!("{}{}", TEST_MODE_PREFIX, name)
        } else {
            name.to_string()
        }
    }
}
