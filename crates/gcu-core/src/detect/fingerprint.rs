//! Fingerprints and their single-record persistence.

use chrono::{DateTime, NaiveDateTime};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default fingerprint file, relative to the working directory.
pub const DEFAULT_FINGERPRINT_FILE: &str = ".webPageMonitor";

/// Persisted timestamp layout (second precision, no zone; always UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date part of a `Last-Modified` value once the weekday and zone are
/// stripped.
const HTTP_DATE_FORMAT: &str = "%d %b %Y %H:%M:%S";

/// Zone tokens accepted by the lenient parser; both mean UTC.
const UTC_ZONES: [&str; 2] = ["GMT", "UTC"];

/// Which kind of fingerprint a strategy produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    MetadataTimestamp,
    ContentHash,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::MetadataTimestamp => write!(f, "metadata"),
            StrategyKind::ContentHash => write!(f, "hash"),
        }
    }
}

/// Last observed state of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fingerprint {
    Timestamp(NaiveDateTime),
    /// Lowercase hex SHA-256.
    Digest(String),
}

impl Fingerprint {
    /// Fingerprint of a body: SHA-256 over the exact bytes.
    pub fn of_content(body: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(body);
        Fingerprint::Digest(hex::encode(hasher.finalize()))
    }

    /// Parse an HTTP `Last-Modified` value.
    ///
    /// RFC 2822 dates are accepted with any zone chrono understands. Otherwise the value must
    /// look like `Ddd, DD Mon YYYY HH:MM:SS GMT` (or `UTC`); the weekday is
    /// not checked against the date.
    pub fn from_http_date(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
            return Some(Fingerprint::Timestamp(dt.naive_utc()));
        }

        let rest = UTC_ZONES
            .iter()
            .find_map(|zone| value.strip_suffix(*zone))?
            .trim_end();
        let (_weekday, date) = rest.split_once(',')?;
        NaiveDateTime::parse_from_str(date.trim(), HTTP_DATE_FORMAT)
            .ok()
            .map(Fingerprint::Timestamp)
    }

    /// Parse a persisted timestamp record.
    pub fn parse_timestamp(record: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(record.trim(), TIMESTAMP_FORMAT)
            .ok()
            .map(Fingerprint::Timestamp)
    }

    /// Canonical text written to the store.
    pub fn to_record(&self) -> String {
        match self {
            Fingerprint::Timestamp(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
            Fingerprint::Digest(hex) => hex.clone(),
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_record())
    }
}

/// Storage for exactly one opaque fingerprint record.
pub trait FingerprintStore {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> io::Result<Option<String>>;

    /// Replace the stored record.
    fn save(&mut self, record: &str) -> io::Result<()>;
}

/// Fingerprint kept in a single text file.
#[derive(Debug, Clone)]
pub struct FileFingerprintStore {
    path: PathBuf,
}

impl FileFingerprintStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileFingerprintStore {
    fn default() -> Self {
        Self::new(DEFAULT_FINGERPRINT_FILE)
    }
}

impl FingerprintStore for FileFingerprintStore {
    fn load(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let record = content.trim();
                if record.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(record.to_string()))
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&mut self, record: &str) -> io::Result<()> {
        fs::write(&self.path, record)
    }
}

/// In-process store, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryFingerprintStore {
    record: Option<String>,
}

impl MemoryFingerprintStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: impl Into<String>) -> Self {
        Self {
            record: Some(record.into()),
        }
    }

    pub fn record(&self) -> Option<&str> {
        self.record.as_deref()
    }
}

impl FingerprintStore for MemoryFingerprintStore {
    fn load(&self) -> io::Result<Option<String>> {
        Ok(self.record.clone())
    }

    fn save(&mut self, record: &str) -> io::Result<()> {
        self.record = Some(record.to_string());
        Ok(())
    }
}
