//! Transformations applied to the downloaded bot configuration.

use gcu_config::Secrets;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

/// Exchanges the GUI knows about, in output order.
pub const GUI_EXCHANGES: [&str; 4] = ["poloniex", "kraken", "bittrex", "cryptopia"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("downloaded config is missing {0}")]
    MissingField(String),

    #[error("downloaded config field {0} is not an object")]
    NotAnObject(String),

    #[error("secrets reference exchange {0} which is not in the downloaded config")]
    UnknownExchange(String),
}

/// Write the API key and secret of every exchange in `secrets` into
/// `exchanges.<name>.key` and `exchanges.<name>.secret`.
///
/// Returns the updated exchange names.
pub fn apply_secrets(config: &mut Value, secrets: &Secrets) -> Result<Vec<String>, TransformError> {
    let exchanges = object_mut(config, "exchanges")?;
    let mut updated = Vec::with_capacity(secrets.exchanges.len());

    for secret in &secrets.exchanges {
        info!(target: "transform.keys", exchange = %secret.exchange, "Updating API keys");
        let entry = exchanges
            .get_mut(&secret.exchange)
            .ok_or_else(|| TransformError::UnknownExchange(secret.exchange.clone()))?
            .as_object_mut()
            .ok_or_else(|| TransformError::NotAnObject(format!("exchanges.{}", secret.exchange)))?;
        entry.insert("key".to_string(), Value::String(secret.api_key.clone()));
        entry.insert("secret".to_string(), Value::String(secret.api_secret.clone()));
        updated.push(secret.exchange.clone());
    }

    Ok(updated)
}

/// One entry of the GUI configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuiPairConfig {
    pub gunbot_version: String,
    pub exchange: String,
    pub pair: String,
    pub config: GuiPairSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuiPairSettings {
    pub strategy: Value,
    #[serde(rename = "override")]
    pub overrides: Map<String, Value>,
}

/// Build the GUI configuration from `pairs.<exchange>.<pair>` entries.
///
/// Exchanges are visited in [`GUI_EXCHANGES`] order and pairs in document
/// order; exchanges absent from `pairs` are skipped.
pub fn build_gui_config(
    config: &Value,
    gunbot_version: &str,
) -> Result<Vec<GuiPairConfig>, TransformError> {
    let pairs = config
        .get("pairs")
        .ok_or_else(|| TransformError::MissingField("pairs".to_string()))?
        .as_object()
        .ok_or_else(|| TransformError::NotAnObject("pairs".to_string()))?;

    let mut gui = Vec::new();
    for exchange in GUI_EXCHANGES {
        let Some(exchange_pairs) = pairs.get(exchange) else {
            continue;
        };
        info!(target: "transform.gui", exchange, "Updating GUI config");
        let exchange_pairs = exchange_pairs
            .as_object()
            .ok_or_else(|| TransformError::NotAnObject(format!("pairs.{}", exchange)))?;

        for (pair, settings) in exchange_pairs {
            let path = format!("pairs.{}.{}", exchange, pair);
            let strategy = settings
                .get("strategy")
                .cloned()
                .ok_or_else(|| TransformError::MissingField(format!("{}.strategy", path)))?;
            let overrides = settings
                .get("override")
                .ok_or_else(|| TransformError::MissingField(format!("{}.override", path)))?
                .as_object()
                .cloned()
                .ok_or_else(|| TransformError::NotAnObject(format!("{}.override", path)))?;

            gui.push(GuiPairConfig {
                gunbot_version: gunbot_version.to_string(),
                exchange: exchange.to_string(),
                pair: pair.clone(),
                config: GuiPairSettings {
                    strategy,
                    overrides,
                },
            });
        }
    }

    Ok(gui)
}

fn object_mut<'a>(
    value: &'a mut Value,
    field: &str,
) -> Result<&'a mut Map<String, Value>, TransformError> {
    value
        .get_mut(field)
        .ok_or_else(|| TransformError::MissingField(field.to_string()))?
        .as_object_mut()
        .ok_or_else(|| TransformError::NotAnObject(field.to_string()))
}
