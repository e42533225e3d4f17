//! Logging setup for the whiteboard relay binaries.

use std::str::FromStr;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, human friendly output
    Pretty,
    /// One line per event
    #[default]
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format '{other}' (expected 'pretty' or 'compact')")),
        }
    }
}

/// Build the default filter directive for a binary.
///
/// Both the relay library crate and the binary itself log at `default_level`;
/// everything else (axum, hyper, tower) stays at `warn`.
pub fn default_directive(binary_name: &str, default_level: &str) -> String {
    format!(
        "warn,whiteboard_relay={level},{bin}={level},tower_http={level}",
        level = default_level,
        bin = binary_name.replace('-', "_"),
    )
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_level` when set.
///
/// # Examples
///
/// ```no_run
/// use whiteboard_shared::logger::{LogFormat, setup_logger};
///
/// setup_logger("whiteboard-relay", "debug", LogFormat::Compact);
/// ```
pub fn setup_logger(binary_name: &str, default_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive(binary_name, default_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact().with_target(true))
            .init(),
    }
}
