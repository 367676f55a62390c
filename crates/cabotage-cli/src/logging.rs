//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout stays parseable when `--format json` is used.
//! The level comes from `RUST_LOG` and defaults to `info`.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Install the global subscriber. Calling it twice is harmless; the second
/// call is ignored.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
    };
    // Already initialized (tests, embedding).
    let _ = result;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parses_from_cli_value() {
        assert_eq!(LogFormat::from_str("json", true).unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("TEXT", true).unwrap(), LogFormat::Text);
        assert!(LogFormat::from_str("pretty", true).is_err());
    }
}
