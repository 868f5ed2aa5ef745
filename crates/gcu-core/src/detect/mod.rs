//! Change detection for a single remote resource.
//!
//! A [`ChangeDetector`] remembers one fingerprint per resource and answers
//! "did it change since last time?". Two strategies are available:
//! - metadata: compare the `Last-Modified` header (no body download)
//! - hash: compare a SHA-256 digest of the full body
//!
//! The metadata strategy can optionally fall back to hashing when the
//! server does not send `Last-Modified`.

mod fingerprint;
mod strategy;

pub use fingerprint::{
    FileFingerprintStore, Fingerprint, FingerprintStore, MemoryFingerprintStore, StrategyKind,
    DEFAULT_FINGERPRINT_FILE, TIMESTAMP_FORMAT,
};
pub use strategy::{
    DetectionStrategy, Evaluation, HashStrategy, MetadataStrategy, LAST_MODIFIED_HEADER,
};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::fetch::{FetchError, Fetcher};

/// Errors that abort a check.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("header {header} not found in response from {url}. Returned headers:\n\t{headers}")]
    MissingMetadata {
        url: String,
        header: &'static str,
        headers: String,
    },

    #[error("header {header} from {url} is not a valid HTTP date: {value:?}")]
    InvalidMetadata {
        url: String,
        header: &'static str,
        value: String,
    },
}

/// Strategy selection, fixed at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectorOptions {
    /// Always use the hash strategy.
    pub force_hash: bool,
    /// Switch to hashing when `Last-Modified` is missing instead of failing.
    pub auto_fallback_to_hash: bool,
}

impl DetectorOptions {
    pub fn hash() -> Self {
        Self {
            force_hash: true,
            auto_fallback_to_hash: false,
        }
    }

    pub fn metadata() -> Self {
        Self::default()
    }

    pub fn metadata_with_fallback() -> Self {
        Self {
            force_hash: false,
            auto_fallback_to_hash: true,
        }
    }
}

/// Detects whether a resource changed since the previous check.
pub struct ChangeDetector<F, S> {
    url: String,
    options: DetectorOptions,
    fetcher: F,
    store: S,
    changed: bool,
    strategy_used: Option<StrategyKind>,
    last_persist_error: Option<String>,
}

impl<F: Fetcher, S: FingerprintStore> ChangeDetector<F, S> {
    pub fn new(url: impl Into<String>, options: DetectorOptions, fetcher: F, store: S) -> Self {
        Self {
            url: url.into(),
            options,
            fetcher,
            store,
            changed: false,
            strategy_used: None,
            last_persist_error: None,
        }
    }

    /// Result of the most recent [`check`](Self::check); `false` before the first.
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Strategy that produced the most recent result.
    pub fn strategy_used(&self) -> Option<StrategyKind> {
        self.strategy_used
    }

    /// Why the most recent change could not be persisted, if it could not.
    pub fn last_persist_error(&self) -> Option<&str> {
        self.last_persist_error.as_deref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Check the resource once.
    ///
    /// Transport failures and a missing `Last-Modified` header (without
    /// fallback) are returned as errors. Fingerprint store failures are only
    /// logged: a failed read counts as "no prior fingerprint" and a failed
    /// write leaves the returned result intact.
    pub fn check(&mut self) -> Result<bool, DetectError> {
        self.changed = false;
        self.strategy_used = None;
        self.last_persist_error = None;

        info!(
            target: "detect.check_start",
            url = %self.url,
            force_hash = self.options.force_hash,
            auto_fallback = self.options.auto_fallback_to_hash,
            "Checking resource for changes"
        );

        let prior = self.load_prior();
        let (kind, evaluation) = self.evaluate(prior.as_deref())?;

        if evaluation.changed {
            info!(
                target: "detect.changed",
                strategy = %kind,
                previous = ?prior,
                current = %evaluation.fingerprint,
                "Resource changed"
            );
            self.persist(&evaluation.fingerprint);
        } else {
            info!(
                target: "detect.unchanged",
                strategy = %kind,
                current = %evaluation.fingerprint,
                "Resource unchanged"
            );
        }

        self.changed = evaluation.changed;
        self.strategy_used = Some(kind);
        Ok(self.changed)
    }

    fn evaluate(&self, prior: Option<&str>) -> Result<(StrategyKind, Evaluation), DetectError> {
        if self.options.force_hash {
            return run(&HashStrategy, &self.url, prior, &self.fetcher);
        }

        match run(&MetadataStrategy, &self.url, prior, &self.fetcher) {
            Err(DetectError::MissingMetadata {
                header, headers, ..
            }) if self.options.auto_fallback_to_hash => {
                warn!(
                    target: "detect.fallback",
                    header,
                    headers = %headers,
                    "Header not found, switching to hash"
                );
                run(&HashStrategy, &self.url, prior, &self.fetcher)
            }
            Err(e @ DetectError::MissingMetadata { .. }) => {
                warn!(target: "detect.fallback", error = %e, "No usable change signal");
                Err(e)
            }
            other => other,
        }
    }

    fn load_prior(&self) -> Option<String> {
        match self.store.load() {
            Ok(Some(record)) => Some(record),
            Ok(None) => {
                debug!(target: "detect.prior", "No previous fingerprint");
                None
            }
            Err(e) => {
                warn!(
                    target: "detect.prior",
                    error = %e,
                    "Could not read fingerprint, treating as absent"
                );
                None
            }
        }
    }

    fn persist(&mut self, fingerprint: &Fingerprint) {
        if let Err(e) = self.store.save(&fingerprint.to_record()) {
            error!(
                target: "detect.persist",
                error = %e,
                fingerprint = %fingerprint,
                "Error writing fingerprint; next check will report a change again"
            );
            self.last_persist_error = Some(e.to_string());
        }
    }
}

fn run<F: Fetcher>(
    strategy: &dyn DetectionStrategy,
    url: &str,
    prior: Option<&str>,
    fetcher: &F,
) -> Result<(StrategyKind, Evaluation), DetectError> {
    strategy
        .evaluate(url, prior, fetcher)
        .map(|evaluation| (strategy.kind(), evaluation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchMode;
    use crate::test_utils::StaticFetcher;
    use std::io;

    const STAMP: &str = "Wed, 21 Oct 2015 07:28:00 GMT";

    struct BrokenStore;

    impl FingerprintStore for BrokenStore {
        fn load(&self) -> io::Result<Option<String>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }

        fn save(&mut self, _record: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    #[test]
    fn test_first_check_changed_then_unchanged_metadata() {
        let fetcher = StaticFetcher::new("x").with_header("Last-Modified", STAMP);
        let mut detector = ChangeDetector::new(
            "http://example.test/",
            DetectorOptions::metadata(),
            &fetcher,
            MemoryFingerprintStore::new(),
        );

        assert!(detector.check().unwrap());
        assert!(detector.changed());
        assert_eq!(detector.store().record(), Some("2015-10-21 07:28:00"));
        assert_eq!(detector.strategy_used(), Some(StrategyKind::MetadataTimestamp));

        assert!(!detector.check().unwrap());
        assert!(!detector.changed());
        assert!(fetcher.requests().iter().all(|m| *m == FetchMode::HeadersOnly));
    }

    #[test]
    fn test_first_check_changed_then_unchanged_hash() {
        let fetcher = StaticFetcher::new("same bytes");
        let mut detector = ChangeDetector::new(
            "http://example.test/",
            DetectorOptions::hash(),
            &fetcher,
            MemoryFingerprintStore::new(),
        );
        assert!(detector.check().unwrap());
        assert!(!detector.check().unwrap());

        fetcher.set_body("same bytez");
        assert!(detector.check().unwrap());
        assert_eq!(detector.strategy_used(), Some(StrategyKind::ContentHash));
    }

    #[test]
    fn test_missing_metadata_without_fallback_is_error() {
        let fetcher = StaticFetcher::new("x");
        let mut detector = ChangeDetector::new(
            "http://example.test/",
            DetectorOptions::metadata(),
            &fetcher,
            MemoryFingerprintStore::new(),
        );
        let err = detector.check().unwrap_err();
        assert!(matches!(err, DetectError::MissingMetadata { .. }));
        assert!(!detector.changed());
        assert_eq!(detector.store().record(), None);
    }

    #[test]
    fn test_missing_metadata_with_fallback_uses_hash() {
        let fetcher = StaticFetcher::new("x");
        let mut detector = ChangeDetector::new(
            "http://example.test/",
            DetectorOptions::metadata_with_fallback(),
            &fetcher,
            MemoryFingerprintStore::new(),
        );
        assert!(detector.check().unwrap());
        assert_eq!(detector.strategy_used(), Some(StrategyKind::ContentHash));
        assert!(!detector.check().unwrap());
        assert_eq!(
            fetcher.requests(),
            vec![
                FetchMode::HeadersOnly,
                FetchMode::FullBody,
                FetchMode::HeadersOnly,
                FetchMode::FullBody
            ]
        );
    }

    #[test]
    fn test_utc_last_modified_is_metadata_not_error() {
        let fetcher =
            StaticFetcher::new("x").with_header("Last-Modified", "Wed, 21 Oct 2015 07:28:00 UTC");
        let mut detector = ChangeDetector::new(
            "u",
            DetectorOptions::metadata_with_fallback(),
            &fetcher,
            MemoryFingerprintStore::new(),
        );
        assert!(detector.check().unwrap());
        assert_eq!(detector.strategy_used(), Some(StrategyKind::MetadataTimestamp));
        assert_eq!(detector.store().record(), Some("2015-10-21 07:28:00"));
    }

    #[test]
    fn test_strategy_switch_overwrites_other_kind() {
        let fetcher = StaticFetcher::new("x").with_header("Last-Modified", STAMP);
        let digest = Fingerprint::of_content(b"x").to_record();
        let mut detector = ChangeDetector::new(
            "u",
            DetectorOptions::metadata(),
            &fetcher,
            MemoryFingerprintStore::with_record(digest),
        );
        assert!(detector.check().unwrap());
        assert_eq!(detector.store().record(), Some("2015-10-21 07:28:00"));
    }

    #[test]
    fn test_transport_error_propagates() {
        let fetcher = StaticFetcher::failing(503);
        let mut detector =
            ChangeDetector::new("u", DetectorOptions::hash(), &fetcher, MemoryFingerprintStore::new());
        let err = detector.check().unwrap_err();
        assert!(matches!(
            err,
            DetectError::Fetch(FetchError::Status { status: 503, .. })
        ));
    }

    #[test]
    fn test_store_failures_degrade() {
        let fetcher = StaticFetcher::new("x");
        let mut detector = ChangeDetector::new("u", DetectorOptions::hash(), &fetcher, BrokenStore);

        assert!(detector.check().unwrap());
        assert!(detector.last_persist_error().unwrap().contains("denied"));

        // Nothing was persisted, so the resource still looks new.
        assert!(detector.check().unwrap());
    }

    #[test]
    fn test_unchanged_never_writes() {
        let digest = Fingerprint::of_content(b"x").to_record();
        let fetcher = StaticFetcher::new("x");
        let mut detector = ChangeDetector::new(
            "u",
            DetectorOptions::hash(),
            &fetcher,
            MemoryFingerprintStore::with_record(digest.clone()),
        );
        assert!(!detector.check().unwrap());
        assert!(detector.last_persist_error().is_none());
        assert_eq!(detector.store().record(), Some(digest.as_str()));
    }
}
