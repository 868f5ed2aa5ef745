//! Blocking HTTP fetches.
//!
//! The detector and the updater only see the [`Fetcher`] trait; the
//! production implementation wraps a `ureq` agent.

use std::io::Read;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Upper bound on a downloaded body.
pub const MAX_BODY_BYTES: u64 = 16 * 1024 * 1024;

/// How much of the response the caller needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Status and headers only; the body is never read off the wire.
    HeadersOnly,
    /// Status, headers and the complete body.
    FullBody,
}

/// Errors surfaced by a fetch. None of these are retried.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("response body from {url} exceeds {limit} bytes")]
    BodyTooLarge { url: String, limit: u64 },

    #[error("failed reading response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// Response headers in arrival order, looked up case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// First value for `name`, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// One `name: value` per line, for diagnostics.
    pub fn render(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("\n\t")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Headers(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A fetched resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: Headers,
    /// Empty for [`FetchMode::HeadersOnly`].
    pub body: Vec<u8>,
}

/// Capability to retrieve a URL.
pub trait Fetcher {
    fn fetch(&self, url: &str, mode: FetchMode) -> Result<FetchResponse, FetchError>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch(&self, url: &str, mode: FetchMode) -> Result<FetchResponse, FetchError> {
        (**self).fetch(url, mode)
    }
}

/// [`Fetcher`] backed by a blocking `ureq` agent.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("gcu/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(gcu_config::settings::DEFAULT_HTTP_TIMEOUT_SECS))
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, mode: FetchMode) -> Result<FetchResponse, FetchError> {
        debug!(target: "fetch.request", url = %url, mode = ?mode, "Fetching resource");

        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status,
                })
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(FetchError::Transport {
                    url: url.to_string(),
                    message: transport.to_string(),
                })
            }
        };

        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let headers: Headers = response
            .headers_names()
            .into_iter()
            .filter_map(|name| {
                let value = response.header(&name)?.to_string();
                Some((name, value))
            })
            .collect();

        let body = match mode {
            // Dropping the response closes the connection without reading
            // the body.
            FetchMode::HeadersOnly => Vec::new(),
            FetchMode::FullBody => read_body(url, response.into_reader())?,
        };

        debug!(
            target: "fetch.response",
            url = %url,
            status,
            body_bytes = body.len(),
            "Fetched resource"
        );

        Ok(FetchResponse {
            status,
            headers,
            body,
        })
    }
}

fn read_body(url: &str, reader: impl Read) -> Result<Vec<u8>, FetchError> {
    let mut body = Vec::new();
    reader
        .take(MAX_BODY_BYTES + 1)
        .read_to_end(&mut body)
        .map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;
    if body.len() as u64 > MAX_BODY_BYTES {
        return Err(FetchError::BodyTooLarge {
            url: url.to_string(),
            limit: MAX_BODY_BYTES,
        });
    }
    Ok(body)
}
