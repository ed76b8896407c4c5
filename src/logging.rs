//! Structured logging setup.
//!
//! The bridge emits `tracing` events on its own; nothing is printed until a
//! subscriber is installed. [`init`] installs a `tracing-subscriber` fmt
//! subscriber once per process:
//!
//! - `AUTOBIND_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//! - `AUTOBIND_LOG_JSON`: emit JSON lines instead of human-readable text
//!
//! `RUST_LOG` takes precedence over the configured level when set.

use std::sync::OnceLock;

use tracing::Level;
use tracing_subscriber::EnvFilter;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Most verbose level emitted for this crate.
    pub level: Level,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
    /// Include the event target (module path) in each line.
    pub with_targets: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json: false,
            with_targets: true,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(level) = std::env::var("AUTOBIND_LOG_LEVEL") {
            config.level = parse_level(&level).unwrap_or(Level::INFO);
        }

        if let Ok(json) = std::env::var("AUTOBIND_LOG_JSON") {
            config.json = json == "1" || json.eq_ignore_ascii_case("true");
        }

        config
    }

    /// Verbose config for debugging registrations and calls.
    pub fn verbose() -> Self {
        Self {
            level: Level::TRACE,
            ..Self::default()
        }
    }
}

fn parse_level(value: &str) -> Option<Level> {
    match value.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Install the global subscriber. Later calls do nothing.
///
/// If another subscriber is already installed the call is ignored.
pub fn init(config: LogConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "autobind={level},autobind_core={level}",
                level = config.level.as_str().to_lowercase()
            ))
        });

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(config.with_targets);

        let _ = if config.json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
    });
}

/// Initialize from the environment.
pub fn init_from_env() {
    init(LogConfig::from_env());
}

/// Check if [`init`] has run.
pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}
