//! Configuration directory discovery.
//!
//! Resolution order: CLI argument → environment variable → executable
//! directory → current directory.

use std::path::{Path, PathBuf};

/// Where the configuration directory came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via `--config-dir`.
    CliArgument,
    /// Set via `GCU_CONFIG_DIR`.
    Environment,
    /// Directory containing the running binary.
    ExecutableDir,
    /// Process working directory.
    WorkingDir,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::ExecutableDir => write!(f, "executable directory"),
            ConfigSource::WorkingDir => write!(f, "working directory"),
        }
    }
}

pub const ENV_CONFIG_DIR: &str = "GCU_CONFIG_DIR";

/// Resolve the directory that holds `gunbot_config_updater.json`.
///
/// The executable directory only wins when it actually contains the
/// settings file, so a binary installed under `/usr/local/bin` still picks
/// up a settings file from the working directory.
pub fn resolve_config_dir(cli_dir: Option<&Path>) -> (PathBuf, ConfigSource) {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    resolve_from(
        cli_dir,
        std::env::var(ENV_CONFIG_DIR).ok(),
        executable_dir(),
        cwd,
    )
}

fn resolve_from(
    cli_dir: Option<&Path>,
    env_dir: Option<String>,
    exe_dir: Option<PathBuf>,
    cwd: PathBuf,
) -> (PathBuf, ConfigSource) {
    if let Some(dir) = cli_dir {
        return (dir.to_path_buf(), ConfigSource::CliArgument);
    }

    if let Some(dir) = env_dir.filter(|d| !d.trim().is_empty()) {
        return (PathBuf::from(dir), ConfigSource::Environment);
    }

    if let Some(dir) = exe_dir {
        if dir.join(crate::SETTINGS_FILENAME).is_file() {
            return (dir, ConfigSource::ExecutableDir);
        }
    }

    (cwd, ConfigSource::WorkingDir)
}

fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}
