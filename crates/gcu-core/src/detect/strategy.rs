//! The two interchangeable change-detection strategies.

use tracing::{debug, warn};

use super::fingerprint::{Fingerprint, StrategyKind};
use super::DetectError;
use crate::fetch::{FetchMode, Fetcher};

/// Header carrying the server-side modification time.
pub const LAST_MODIFIED_HEADER: &str = "Last-Modified";

/// Outcome of comparing a resource against its prior fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub changed: bool,
    pub fingerprint: Fingerprint,
}

impl Evaluation {
    fn compare(prior: Option<&Fingerprint>, current: Fingerprint) -> Self {
        Self {
            changed: prior != Some(&current),
            fingerprint: current,
        }
    }
}

/// A way of fingerprinting a remote resource.
pub trait DetectionStrategy {
    fn kind(&self) -> StrategyKind;

    /// Fetch `url` and compare it with the raw prior record.
    fn evaluate(
        &self,
        url: &str,
        prior: Option<&str>,
        fetcher: &dyn Fetcher,
    ) -> Result<Evaluation, DetectError>;
}

/// Compares the `Last-Modified` header without downloading the body.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataStrategy;

impl DetectionStrategy for MetadataStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MetadataTimestamp
    }

    fn evaluate(
        &self,
        url: &str,
        prior: Option<&str>,
        fetcher: &dyn Fetcher,
    ) -> Result<Evaluation, DetectError> {
        let prior = prior.and_then(|record| {
            let parsed = Fingerprint::parse_timestamp(record);
            match &parsed {
                Some(ts) => debug!(target: "detect.prior", previous = %ts, "Previous timestamp"),
                None => warn!(
                    target: "detect.prior",
                    record = %record,
                    "Value cannot be converted to a timestamp, treating as absent"
                ),
            }
            parsed
        });

        let response = fetcher.fetch(url, FetchMode::HeadersOnly)?;

        let Some(raw) = response.headers.get(LAST_MODIFIED_HEADER) else {
            return Err(DetectError::MissingMetadata {
                url: url.to_string(),
                header: LAST_MODIFIED_HEADER,
                headers: response.headers.render(),
            });
        };

        let current =
            Fingerprint::from_http_date(raw).ok_or_else(|| DetectError::InvalidMetadata {
                url: url.to_string(),
                header: LAST_MODIFIED_HEADER,
                value: raw.to_string(),
            })?;

        debug!(
            target: "detect.metadata",
            header = LAST_MODIFIED_HEADER,
            raw = %raw,
            timestamp = %current,
            "Header found"
        );

        Ok(Evaluation::compare(prior.as_ref(), current))
    }
}

/// Compares a SHA-256 digest of the full body.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashStrategy;

impl DetectionStrategy for HashStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ContentHash
    }

    fn evaluate(
        &self,
        url: &str,
        prior: Option<&str>,
        fetcher: &dyn Fetcher,
    ) -> Result<Evaluation, DetectError> {
        if let Some(previous) = prior {
            debug!(target: "detect.prior", previous = %previous, "Previous hash");
        }
        // The record is opaque here; a stored timestamp simply never matches.
        let prior = prior.map(|record| Fingerprint::Digest(record.to_string()));

        let response = fetcher.fetch(url, FetchMode::FullBody)?;
        let current = Fingerprint::of_content(&response.body);

        Ok(Evaluation::compare(prior.as_ref(), current))
    }
}
