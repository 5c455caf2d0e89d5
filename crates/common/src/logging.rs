//! Provides utilities to initialize logging.
use std::env;

use tracing::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable name for the service label, which is appended to the whoami string.
pub const SVC_LABEL_ENVVAR: &str = "SCDB_SVC_LABEL";

/// The filter used when `RUST_LOG` is not set.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Configuration for the logger.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// The whoami string, which is used to identify the service in logs.
    whoami: String,

    /// The filter directive used when `RUST_LOG` is unset or invalid.
    default_directive: String,

    /// Whether to colorize the output.
    ansi: bool,
}

impl LoggerConfig {
    /// Creates a new instance with whoami set and the default filter.
    pub fn new(whoami: String) -> Self {
        Self {
            whoami,
            default_directive: DEFAULT_DIRECTIVE.to_owned(),
            ansi: true,
        }
    }

    /// Creates a new instance with the whoami string derived from `s`.
    pub fn with_base_name(s: &str) -> Self {
        Self::new(get_whoami_string(s))
    }

    /// Sets the filter used when `RUST_LOG` is not set, e.g. `debug` for a `--verbose` flag.
    pub fn set_default_directive(&mut self, directive: impl Into<String>) {
        self.default_directive = directive.into();
    }

    /// Disables colored output, for when stdout is not a terminal.
    pub fn disable_ansi(&mut self) {
        self.ansi = false;
    }

    /// The whoami string.
    pub fn whoami(&self) -> &str {
        &self.whoami
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.default_directive))
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::with_base_name("(scdb)")
    }
}

/// Initializes the logging subsystem with the provided config.
///
/// Logs go to stderr so that command output on stdout stays machine-readable.
pub fn init(config: LoggerConfig) {
    let log_file = env::var("LOG_FILE").is_ok_and(|v| v == "1");
    let log_line_num = env::var("LOG_LINE_NUM").is_ok_and(|v| v == "1");

    let stderr_sub = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(config.ansi)
        .event_format(
            tracing_subscriber::fmt::format()
                .with_file(log_file)
                .with_line_number(log_line_num),
        )
        .with_filter(config.env_filter());

    tracing_subscriber::registry().with(stderr_sub).init();

    info!(whoami = %config.whoami, "logging started");
}

/// Gets the service label from the standard envvar, which should be included in the whoami string.
pub fn get_service_label_from_env() -> Option<String> {
    env::var(SVC_LABEL_ENVVAR).ok()
}

/// Computes a standard whoami string.
pub fn get_whoami_string(base: &str) -> String {
    match get_service_label_from_env() {
        Some(label) => format!("{base}%{label}"),
        None => base.to_owned(),
    }
}
