//! Structured logging for gcu.
//!
//! Library code only emits `tracing` events. The binary turns a
//! [`LogConfig`] into a subscriber once at startup; tests can build their
//! own with [`build_subscriber`] and scope it with
//! `tracing::subscriber::with_default`.
//!
//! - stdout is left untouched
//! - stderr receives all log output (human or JSONL)
//! - every run carries a `run_id` span field

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel};

use std::io::IsTerminal;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Build a subscriber for `config` that writes to `writer`.
pub fn build_subscriber<W>(config: &LogConfig, writer: W, ansi: bool) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::new(config.level.to_string());

    match config.format {
        LogFormat::Human => {
            let fmt_layer = fmt::layer()
                .with_writer(writer)
                .with_target(false)
                .with_ansi(ansi);

            if config.timestamps {
                Box::new(tracing_subscriber::registry().with(filter).with(fmt_layer))
            } else {
                Box::new(
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt_layer.without_time()),
                )
            }
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_current_span(true)
                .with_span_list(false);
            Box::new(tracing_subscriber::registry().with(filter).with(json_layer))
        }
    }
}

/// Install the global subscriber, logging to stderr.
///
/// Must be called once at startup before any logging occurs.
pub fn init_logging(config: &LogConfig) {
    let ansi = config.color && std::io::stderr().is_terminal();
    let subscriber = build_subscriber(config, std::io::stderr, ansi);
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: logging already initialized; keeping the existing subscriber.");
    }
}

/// Generate a unique run ID for this invocation.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    // Shorten to first 12 hex chars for readability
    format!("run-{}", &uuid.simple().to_string()[..12])
}
