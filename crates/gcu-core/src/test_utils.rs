//! Test doubles shared by unit tests.

use std::cell::RefCell;

use crate::fetch::{FetchError, FetchMode, FetchResponse, Fetcher, Headers};

/// Serves one canned response and records every request mode.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    body: RefCell<Vec<u8>>,
    headers: Headers,
    fail_with_status: Option<u16>,
    requests: RefCell<Vec<FetchMode>>,
}

impl StaticFetcher {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: RefCell::new(body.into()),
            ..Self::default()
        }
    }

    /// Every request fails with this HTTP status.
    pub fn failing(status: u16) -> Self {
        Self {
            fail_with_status: Some(status),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replace the body served from now on.
    pub fn set_body(&self, body: impl Into<Vec<u8>>) {
        *self.body.borrow_mut() = body.into();
    }

    pub fn requests(&self) -> Vec<FetchMode> {
        self.requests.borrow().clone()
    }
}

impl Fetcher for StaticFetcher {
    fn fetch(&self, url: &str, mode: FetchMode) -> Result<FetchResponse, FetchError> {
        self.requests.borrow_mut().push(mode);
        if let Some(status) = self.fail_with_status {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        let body = match mode {
            FetchMode::HeadersOnly => Vec::new(),
            FetchMode::FullBody => self.body.borrow().clone(),
        };
        Ok(FetchResponse {
            status: 200,
            headers: self.headers.clone(),
            body,
        })
    }
}
