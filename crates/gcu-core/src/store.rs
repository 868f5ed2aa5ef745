//! One-generation backup and rollback for managed config files.
//!
//! Every managed file `<dest>` has at most one backup, `<dest>.backup`.
//! A commit replaces that backup with the pre-commit content, and a rollback
//! restores it and then deletes it, so rollback is a one-shot undo.
//!
//! The steps are not journaled: a failure between deleting the old backup,
//! creating the new one, and writing the destination can leave a partial
//! state. Nothing is fsynced.

use filetime::FileTime;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Suffix appended to a destination file name to form its backup path.
pub const BACKUP_SUFFIX: &str = ".backup";

/// Errors from commit and rollback.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize content for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to {op} {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_err<'a>(op: &'static str, path: &'a Path) -> impl FnOnce(io::Error) -> StoreError + 'a {
    move |source| {
        error!(target: "store.io", op, path = ?path, error = %source, "Local storage failure");
        StoreError::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Backup path for `dest`: the full file name plus `.backup`.
pub fn backup_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// What a commit did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Backup holding the pre-commit content, when one was taken.
    pub backup: Option<PathBuf>,
    pub bytes_written: usize,
}

/// What a rollback did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackOutcome {
    /// The backup was copied over the destination and removed.
    Restored { backup: PathBuf },
    /// There was nothing to roll back to.
    NoBackup,
}

/// Writes JSON config files with a single-generation backup.
#[derive(Debug, Clone)]
pub struct TransactionalConfigStore {
    indent: Vec<u8>,
}

impl Default for TransactionalConfigStore {
    fn default() -> Self {
        Self {
            indent: b"    ".to_vec(),
        }
    }
}

impl TransactionalConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `width` spaces per indentation level.
    pub fn with_indent(width: usize) -> Self {
        Self {
            indent: vec![b' '; width],
        }
    }

    pub fn has_backup(&self, dest: &Path) -> bool {
        backup_path(dest).is_file()
    }

    /// Replace `dest` with `content`, serialized as indented JSON.
    ///
    /// Keys keep their declared (insertion) order and non-ASCII text is
    /// written verbatim. With `with_backup`, any existing backup is deleted
    /// and the current destination, if present, is copied to the backup
    /// with its permissions and timestamps.
    pub fn commit<T: Serialize + ?Sized>(
        &self,
        dest: &Path,
        content: &T,
        with_backup: bool,
    ) -> Result<CommitOutcome, StoreError> {
        // Serialize before touching the filesystem.
        let bytes = self.serialize(dest, content)?;
        let backup = backup_path(dest);
        let mut created_backup = None;

        if with_backup && backup.is_file() {
            info!(target: "store.commit", backup = ?backup, "Deleting old backup file");
            fs::remove_file(&backup).map_err(io_err("remove old backup", &backup))?;
        }

        if with_backup && dest.is_file() {
            info!(
                target: "store.commit",
                from = ?dest,
                to = ?backup,
                "Backing up config file"
            );
            copy_preserving(dest, &backup).map_err(io_err("create backup", &backup))?;
            created_backup = Some(backup);
        }

        fs::write(dest, &bytes).map_err(io_err("write", dest))?;

        info!(
            target: "store.commit",
            path = ?dest,
            bytes = bytes.len(),
            backup = created_backup.is_some(),
            "Config file written"
        );

        Ok(CommitOutcome {
            backup: created_backup,
            bytes_written: bytes.len(),
        })
    }

    /// Restore the backup of `dest` and delete the backup.
    ///
    /// Without a backup this is a logged no-op. A missing destination is
    /// still restored.
    pub fn rollback(&self, dest: &Path) -> Result<RollbackOutcome, StoreError> {
        let backup = backup_path(dest);

        if !backup.is_file() {
            info!(
                target: "store.rollback_skip",
                backup = ?backup,
                "Backup file does not exist, skipping"
            );
            return Ok(RollbackOutcome::NoBackup);
        }

        info!(target: "store.rollback_start", path = ?dest, backup = ?backup, "Rolling back");

        if dest.exists() {
            debug!(target: "store.rollback_start", path = ?dest, "Deleting configuration file");
            fs::remove_file(dest).map_err(io_err("remove", dest))?;
        }

        copy_preserving(&backup, dest).map_err(io_err("restore", dest))?;
        fs::remove_file(&backup).map_err(io_err("remove backup", &backup))?;

        info!(
            target: "store.rollback_complete",
            path = ?dest,
            "Previous configuration restored"
        );

        Ok(RollbackOutcome::Restored { backup })
    }

    /// Read a managed file back.
    pub fn read<T: DeserializeOwned>(&self, path: &Path) -> Result<T, StoreError> {
        let content = fs::read(path).map_err(|source| StoreError::Io {
            op: "read",
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&content).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn serialize<T: Serialize + ?Sized>(
        &self,
        dest: &Path,
        content: &T,
    ) -> Result<Vec<u8>, StoreError> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(&self.indent);
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        content
            .serialize(&mut serializer)
            .map_err(|source| StoreError::Serialize {
                path: dest.to_path_buf(),
                source,
            })?;
        Ok(out)
    }
}

/// Copy a file with its permissions and access/modification times.
fn copy_preserving(from: &Path, to: &Path) -> io::Result<()> {
    fs::copy(from, to)?;
    let meta = fs::metadata(from)?;
    let atime = FileTime::from_last_access_time(&meta);
    let mtime = FileTime::from_last_modification_time(&meta);
    if let Err(e) = filetime::set_file_times(to, atime, mtime) {
        warn!(target: "store.copy", path = ?to, error = %e, "Could not preserve file times");
    }
    Ok(())
}
