//! Logging infrastructure using `tracing` and `tracing-subscriber`.
//!
//! Everything goes to stderr so stdout stays clean for `--json` and
//! stdout table output.
//!
//! # Log Levels
//!
//! - `error`: failed requests, fatal errors
//! - `warn`: rejected uploads, recoverable issues
//! - `info`: command and request summaries
//! - `debug`: layout detection, column mapping, join keys
//! - `trace`: row-level values

use std::io;

use invaudit_config::LogFormat;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crates whose events follow the configured level. Everything else stays at `warn`.
const OWN_CRATES: [&str; 5] = [
    "invaudit",
    "invaudit_recon",
    "invaudit_io",
    "invaudit_config",
    "invaudit_server",
];

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level for our crates (error, warn, info, debug, trace).
    pub level: String,
    pub format: LogFormat,
    /// Whether to include target (module path) in log output.
    pub with_target: bool,
    /// Whether to use ANSI colors in output.
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            with_target: false,
            with_ansi: true,
        }
    }
}

impl LogConfig {
    /// Level from the `-v` count, or `default_level` when none was given.
    ///
    /// - 0: `default_level` (settings `[logging] level`)
    /// - 1 (`-v`): debug
    /// - 2+ (`-vv`): trace
    #[must_use]
    pub fn from_verbosity(verbosity: u8, default_level: &str) -> Self {
        let level = match verbosity {
            0 => default_level.to_string(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        };
        Self {
            level,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_target(mut self, enable: bool) -> Self {
        self.with_target = enable;
        self
    }

    #[must_use]
    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }

    /// Filter directives when `RUST_LOG` is not set.
    pub fn directives(&self) -> String {
        let mut directives = vec!["warn".to_string()];
        directives.extend(OWN_CRATES.iter().map(|c| format!("{c}={}", self.level)));
        directives.join(",")
    }
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(config: &LogConfig) {
    let filter = build_env_filter(config);
    let registry = tracing_subscriber::registry().with(filter);

    // try_init: tests and embedders may already have a subscriber
    let _ = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(io::stderr)
                    .with_target(config.with_target),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(io::stderr)
                    .with_ansi(config.with_ansi)
                    .with_target(config.with_target)
                    .without_time(),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_ansi(config.with_ansi)
                    .with_target(config.with_target)
                    .without_time(),
            )
            .try_init(),
    };
}

/// `RUST_LOG` wins; otherwise our crates at the configured level.
fn build_env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(config.directives()).unwrap_or_else(|_| EnvFilter::new("warn"))
    })
}
