//! Logging setup for the inclusion engine.
//!
//! The engine itself only emits `tracing` events; nothing is printed unless a
//! subscriber is installed. [`init`] installs one when asked to through the
//! environment or the `[debug]` section of `sideload.toml`:
//!
//! - `SIDELOAD_DEBUG=true|1|yes` - enable debug logging
//! - `SIDELOAD_LOG_LEVEL=trace|debug|info|warn|error` - set the level
//! - `SIDELOAD_LOG_FORMAT=json|pretty|compact` - output format (default: json)
//!
//! Environment variables win over the configuration file.
//!
//! ```rust,no_run
//! use sideload_core::logging;
//!
//! logging::init();
//! ```
//!
//! Installing the subscriber requires the `tracing-subscriber` feature.

use std::env;
use std::sync::Once;

use sideload_schema::config::DebugConfig;

static INIT: Once = Once::new();

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Check if `SIDELOAD_DEBUG` is set to "true", "1" or "yes".
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("SIDELOAD_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

fn normalize_level(level: &str) -> Option<&'static str> {
    let level = level.to_lowercase();
    LEVELS.into_iter().find(|l| *l == level)
}

fn normalize_format(format: &str) -> &'static str {
    match format.to_lowercase().as_str() {
        "pretty" => "pretty",
        "compact" => "compact",
        _ => "json",
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings {
    /// Level directive applied to the sideload crates.
    pub level: &'static str,
    /// Output format.
    pub format: &'static str,
    /// Whether anything asked for logging at all.
    pub requested: bool,
}

impl LogSettings {
    /// Resolve settings from the environment, falling back to `config`.
    pub fn resolve(config: &DebugConfig) -> Self {
        let env_level = env::var("SIDELOAD_LOG_LEVEL").ok();
        let debug = is_debug_enabled();

        let level = env_level
            .as_deref()
            .and_then(normalize_level)
            .or_else(|| config.log_level.as_deref().and_then(normalize_level))
            .unwrap_or(if debug { "debug" } else { "warn" });

        let format = env::var("SIDELOAD_LOG_FORMAT")
            .ok()
            .or_else(|| config.log_format.clone())
            .map_or("json", |f| normalize_format(&f));

        Self {
            level,
            format,
            requested: debug || env_level.is_some() || config.log_level.is_some(),
        }
    }

    /// `EnvFilter` directive covering every sideload crate.
    pub fn directive(&self) -> String {
        ["sideload", "sideload_core", "sideload_schema", "sideload_axum"]
            .iter()
            .map(|target| format!("{}={}", target, self.level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Get the configured log level.
///
/// Defaults to "debug" if `SIDELOAD_DEBUG` is enabled, otherwise "warn".
pub fn get_log_level() -> &'static str {
    LogSettings::resolve(&DebugConfig::default()).level
}

/// Get the configured log format. Defaults to "json".
pub fn get_log_format() -> &'static str {
    LogSettings::resolve(&DebugConfig::default()).format
}

/// Initialize logging from the environment.
///
/// Subsequent calls are no-ops.
pub fn init() {
    init_with_config(&DebugConfig::default());
}

/// Initialize logging from the environment and a `[debug]` config section.
pub fn init_with_config(config: &DebugConfig) {
    INIT.call_once(|| {
        let settings = LogSettings::resolve(config);
        if !settings.requested {
            return;
        }
        install(settings);
    });
}

#[cfg(feature = "tracing-subscriber")]
fn install(settings: LogSettings) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_new(settings.directive()).unwrap_or_else(|_| EnvFilter::new("warn"));

    let installed = match settings.format {
        "json" => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init(),
        "compact" => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .try_init(),
    };

    if installed.is_ok() {
        tracing::info!(
            level = settings.level,
            format = settings.format,
            "Sideload logging initialized"
        );
    }
}

#[cfg(not(feature = "tracing-subscriber"))]
fn install(_settings: LogSettings) {
    // Without the subscriber feature the host application installs its own.
}
