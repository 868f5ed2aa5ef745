//! The update pipeline: download, transform, commit, restart, and its
//! rollback counterpart.

use std::path::PathBuf;
use std::time::Duration;

use gcu_config::{load_secrets, ConfigError, ResolvedSettings, Secrets};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::fetch::{FetchError, FetchMode, Fetcher, HttpFetcher};
use crate::restart::{CommandRunner, RestartError, ServiceCommands, ServiceController, SystemRunner};
use crate::store::{RollbackOutcome, StoreError, TransactionalConfigStore};
use crate::transform::{apply_secrets, build_gui_config, TransformError};

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("downloaded config from {url} is not valid JSON: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Restart(#[from] RestartError),
}

/// What a successful [`ConfigUpdater::execute`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    /// Files written, in commit order.
    pub written: Vec<PathBuf>,
    /// Backups taken during this run.
    pub backups: Vec<PathBuf>,
    /// Exchanges whose keys were injected.
    pub exchanges: Vec<String>,
    /// Whether the service restart sequence ran (or was logged in test mode).
    pub restarted: bool,
}

/// Downloads the bot configuration and installs it.
pub struct ConfigUpdater<F = HttpFetcher, R = SystemRunner> {
    settings: ResolvedSettings,
    secrets: Secrets,
    fetcher: F,
    store: TransactionalConfigStore,
    services: ServiceController<R>,
}

impl ConfigUpdater<HttpFetcher, SystemRunner> {
    /// Production wiring: loads `secrets.json` and builds an HTTP fetcher
    /// with the configured timeout.
    pub fn from_settings(settings: ResolvedSettings) -> Result<Self, UpdateError> {
        let secrets = load_secrets(&settings)?;
        info!(
            target: "update.secrets",
            path = ?settings.secrets_path(),
            exchanges = secrets.exchanges.len(),
            "Loaded API keys"
        );
        let fetcher = HttpFetcher::new(Duration::from_secs(settings.settings.http.timeout_secs));
        let services = ServiceController::new(settings.test_mode());
        Ok(Self::new(settings, secrets, fetcher, services))
    }
}

impl<F: Fetcher, R: CommandRunner> ConfigUpdater<F, R> {
    pub fn new(
        settings: ResolvedSettings,
        secrets: Secrets,
        fetcher: F,
        services: ServiceController<R>,
    ) -> Self {
        Self {
            settings,
            secrets,
            fetcher,
            store: TransactionalConfigStore::new(),
            services,
        }
    }

    pub fn settings(&self) -> &ResolvedSettings {
        &self.settings
    }

    /// Paths this updater manages, bot config first.
    pub fn managed_files(&self) -> Vec<PathBuf> {
        let mut files = vec![self.settings.gunbot_config_path()];
        if self.settings.gui_enabled() {
            files.push(self.settings.gui_config_path());
        }
        files
    }

    /// Fetch the configuration at `url` and install it.
    pub fn execute(&self, url: &str) -> Result<UpdateReport, UpdateError> {
        info!(target: "update.start", url = %url, "Loading Gunbot configuration");

        let response = self.fetcher.fetch(url, FetchMode::FullBody)?;
        let mut config: Value =
            serde_json::from_slice(&response.body).map_err(|source| UpdateError::Parse {
                url: url.to_string(),
                source,
            })?;

        let exchanges = apply_secrets(&mut config, &self.secrets)?;
        // Derive everything before the first commit so a bad document
        // leaves both files untouched.
        let gui = if self.settings.gui_enabled() {
            Some(build_gui_config(
                &config,
                &self.settings.settings.gui.gunbot_version,
            )?)
        } else {
            None
        };
        let with_backup = self.settings.backup_enabled();
        let mut report = UpdateReport {
            written: Vec::new(),
            backups: Vec::new(),
            exchanges,
            restarted: false,
        };

        let gunbot_path = self.settings.gunbot_config_path();
        let outcome = self.store.commit(&gunbot_path, &config, with_backup)?;
        report.written.push(gunbot_path);
        report.backups.extend(outcome.backup);

        if let Some(gui) = gui {
            let gui_path = self.settings.gui_config_path();
            let outcome = self.store.commit(&gui_path, &gui, with_backup)?;
            report.written.push(gui_path);
            report.backups.extend(outcome.backup);

            self.services.restart(&self.service_commands())?;
            report.restarted = true;
        }

        info!(
            target: "update.complete",
            files = report.written.len(),
            backups = report.backups.len(),
            restarted = report.restarted,
            "Configuration updated"
        );
        Ok(report)
    }

    /// Restore the previous version of every managed file.
    pub fn rollback(&self) -> Result<Vec<(PathBuf, RollbackOutcome)>, UpdateError> {
        info!(target: "update.rollback", "Rollback configuration files to previous version");
        let mut results = Vec::new();
        for path in self.managed_files() {
            let outcome = self.store.rollback(&path)?;
            results.push((path, outcome));
        }
        Ok(results)
    }

    fn service_commands(&self) -> ServiceCommands {
        let s = &self.settings.settings;
        ServiceCommands {
            gunbot_stop: s.gunbot.stop.clone(),
            gunbot_start: s.gunbot.start.clone(),
            gui_stop: s.gui.stop.clone(),
            gui_start: s.gui.start.clone(),
        }
    }
}
