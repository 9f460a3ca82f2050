//! Tracing bootstrap.
//!
//! Structured, async-aware logging built on `tracing` and
//! `tracing-subscriber`. Filtering follows `RUST_LOG` when set and falls back
//! to the configured default level; output format is selectable between
//! pretty, compact, and JSON.

use crate::config::{AppConfig, LogFormat};
use crate::error::{AppResult, BatteryOscError};
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber from configuration.
///
/// Returns an error if a subscriber is already installed.
pub fn init(config: &AppConfig) -> AppResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| {
            BatteryOscError::Configuration(format!(
                "invalid log_level '{}': {}",
                config.log_level, e
            ))
        })?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match config.log_format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Compact => builder.compact().with_ansi(false).try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    result.map_err(|e| {
        BatteryOscError::Configuration(format!("failed to install tracing subscriber: {}", e))
    })
}
