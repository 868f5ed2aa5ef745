//! Gunbot config updater core library.
//!
//! This library provides:
//! - Change detection for a remote resource (`detect`)
//! - One-generation backup and rollback of config files (`store`)
//! - The download → transform → commit → restart pipeline (`updater`)
//! - Logging setup and CLI exit codes
//!
//! The binary entry point is in `main.rs`.

pub mod detect;
pub mod exit_codes;
pub mod fetch;
pub mod logging;
pub mod restart;
pub mod store;
pub mod transform;
pub mod updater;

pub use detect::{ChangeDetector, DetectError, DetectorOptions};
pub use store::{RollbackOutcome, TransactionalConfigStore};
pub use updater::{ConfigUpdater, UpdateError};

#[cfg(test)]
mod test_utils;
