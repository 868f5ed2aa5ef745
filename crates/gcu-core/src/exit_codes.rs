//! Exit codes for the gcu CLI.
//!
//! Exit code ranges:
//! - 0: success, including "resource unchanged, nothing to do"
//! - 10-19: user/environment errors (recoverable by user action)
//! - 20-29: local I/O errors

use crate::detect::DetectError;
use crate::updater::UpdateError;

/// Exit codes for gcu operations.
///
/// These codes are a stable contract for cron jobs and wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Updated, rolled back, or nothing to do.
    Ok = 0,

    /// Invalid arguments
    ArgsError = 10,

    /// Settings or secrets missing or invalid
    ConfigError = 11,

    /// The server sent no `Last-Modified` header and fallback is disabled
    MissingMetadata = 12,

    /// Network or HTTP failure, or an unusable downloaded document
    FetchError = 13,

    /// A service stop/start command failed
    RestartError = 14,

    /// Local file I/O error
    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Ok
    }

    /// Check if this exit code is a user/environment error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    /// Get the error code name as a string constant.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Ok => "OK",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::MissingMetadata => "ERR_MISSING_METADATA",
            ExitCode::FetchError => "ERR_FETCH",
            ExitCode::RestartError => "ERR_RESTART",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

impl From<&DetectError> for ExitCode {
    fn from(err: &DetectError) -> Self {
        match err {
            DetectError::MissingMetadata { .. } => ExitCode::MissingMetadata,
            DetectError::InvalidMetadata { .. } | DetectError::Fetch(_) => ExitCode::FetchError,
        }
    }
}

impl From<&UpdateError> for ExitCode {
    fn from(err: &UpdateError) -> Self {
        match err {
            UpdateError::Config(_) => ExitCode::ConfigError,
            UpdateError::Fetch(_) | UpdateError::Parse { .. } | UpdateError::Transform(_) => {
                ExitCode::FetchError
            }
            UpdateError::Store(_) => ExitCode::IoError,
            UpdateError::Restart(_) => ExitCode::RestartError,
        }
    }
}
