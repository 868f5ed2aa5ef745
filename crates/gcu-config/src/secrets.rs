//! Exchange API credentials kept outside the downloaded configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Contents of `secrets.json`.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub exchanges: Vec<ExchangeSecret>,
}

/// Credentials for a single exchange.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeSecret {
    pub exchange: String,
    pub api_key: String,
    pub api_secret: String,
}

// Keys must never reach the logs, so Debug only shows exchange names.
impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.exchanges.iter()).finish()
    }
}

impl fmt::Debug for ExchangeSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeSecret")
            .field("exchange", &self.exchange)
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .finish()
    }
}
