//! Stopping and starting the bot and its GUI after an update.

use std::process::{Command, Output};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RestartError {
    #[error("empty {0} command")]
    EmptyCommand(&'static str),

    #[error("failed to run {label} command {command:?}: {source}")]
    Spawn {
        label: &'static str,
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{label} command {command:?} exited with {code:?}: {stderr}")]
    Failed {
        label: &'static str,
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Shell-free command execution, so tests can observe what would run.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> std::io::Result<Output>;
}

/// Runs commands with [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> std::io::Result<Output> {
        Command::new(program).args(args).output()
    }
}

/// The four service commands, in settings order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCommands {
    pub gunbot_stop: String,
    pub gunbot_start: String,
    pub gui_stop: String,
    pub gui_start: String,
}

impl ServiceCommands {
    /// Restart sequence: stop bot, stop GUI, start GUI, start bot.
    fn sequence(&self) -> [(&'static str, &str); 4] {
        [
            ("gunbot stop", self.gunbot_stop.as_str()),
            ("gui stop", self.gui_stop.as_str()),
            ("gui start", self.gui_start.as_str()),
            ("gunbot start", self.gunbot_start.as_str()),
        ]
    }
}

/// Restarts services, or only logs the commands in test mode.
pub struct ServiceController<R = SystemRunner> {
    runner: R,
    test_mode: bool,
}

impl ServiceController<SystemRunner> {
    pub fn new(test_mode: bool) -> Self {
        Self::with_runner(SystemRunner, test_mode)
    }
}

impl<R: CommandRunner> ServiceController<R> {
    pub fn with_runner(runner: R, test_mode: bool) -> Self {
        Self { runner, test_mode }
    }

    pub fn restart(&self, commands: &ServiceCommands) -> Result<(), RestartError> {
        for (label, command) in commands.sequence() {
            if self.test_mode {
                info!(target: "restart.dry_run", label, command = %command, "Would run");
                continue;
            }
            self.run_one(label, command)?;
        }
        Ok(())
    }

    fn run_one(&self, label: &'static str, command: &str) -> Result<(), RestartError> {
        // Split on single spaces; quoting is not supported.
        let mut parts = command.split(' ').filter(|p| !p.is_empty());
        let program = parts.next().ok_or(RestartError::EmptyCommand(label))?;
        let args: Vec<&str> = parts.collect();

        info!(target: "restart.run", label, command = %command, "Running service command");
        let output = self
            .runner
            .run(program, &args)
            .map_err(|source| RestartError::Spawn {
                label,
                command: command.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(RestartError::Failed {
                label,
                command: command.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!(
            target: "restart.run",
            label,
            stdout = %String::from_utf8_lossy(&output.stdout).trim(),
            "Service command finished"
        );
        Ok(())
    }
}
