//! Configuration loading and validation.
//!
//! Configuration is layered with `figment`:
//! 1. Built-in defaults (the reference deployment: 6 slots, VRChat's OSC
//!    endpoint at 127.0.0.1:9000, 10 s update interval)
//! 2. An optional TOML file
//! 3. Environment variables prefixed with `BATTERY_OSC_`
//!
//! # Example
//! ```no_run
//! use battery_osc::config::AppConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load(None)?;
//! config.validate()?;
//! println!("broadcasting to {}", config.destination()?);
//! # Ok(())
//! # }
//! ```

use crate::error::{AppResult, BatteryOscError};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix for configuration overrides.
const ENV_PREFIX: &str = "BATTERY_OSC_";

/// Log output format, mirroring the tracing subscriber setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Pretty-printed with colors (development).
    Pretty,
    /// Compact single-line output (production).
    Compact,
    /// JSON for log aggregation.
    Json,
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Number of broadcast slots. Each occupied slot emits one message per tick.
    pub slot_count: usize,
    /// Destination host for outbound OSC messages.
    pub destination_host: String,
    /// Destination UDP port for outbound OSC messages.
    pub destination_port: u16,
    /// OSC address prefix; the zero-padded slot index is appended to it.
    pub parameter_prefix: String,
    /// Delay before the one-shot warm-up tick, in seconds.
    pub warm_up_delay_secs: f64,
    /// Period of the steady tick, in seconds.
    pub update_interval_secs: f64,
    /// Default log level when `RUST_LOG` is not set (trace..error).
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            slot_count: 6,
            destination_host: "127.0.0.1".to_string(),
            destination_port: 9000,
            parameter_prefix: "/avatar/parameters/BatteryFloat".to_string(),
            warm_up_delay_secs: 1.0,
            update_interval_secs: 10.0,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then an optional TOML file, then
    /// `BATTERY_OSC_*` environment variables.
    pub fn load(config_path: Option<&Path>) -> AppResult<Self> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }
        let config: AppConfig = figment.merge(Env::prefixed(ENV_PREFIX)).extract()?;
        Ok(config)
    }

    /// Semantic validation of values that parse but cannot work.
    pub fn validate(&self) -> AppResult<()> {
        if self.slot_count == 0 {
            return Err(BatteryOscError::Configuration(
                "slot_count must be at least 1".into(),
            ));
        }
        if !self.parameter_prefix.starts_with('/') {
            return Err(BatteryOscError::Configuration(format!(
                "parameter_prefix must start with '/', got '{}'",
                self.parameter_prefix
            )));
        }
        if self.destination_port == 0 {
            return Err(BatteryOscError::Configuration(
                "destination_port must be non-zero".into(),
            ));
        }
        if self.warm_up_delay_secs <= 0.0 || !self.warm_up_delay_secs.is_finite() {
            return Err(BatteryOscError::Configuration(
                "warm_up_delay_secs must be positive".into(),
            ));
        }
        if self.update_interval_secs <= 0.0 || !self.update_interval_secs.is_finite() {
            return Err(BatteryOscError::Configuration(
                "update_interval_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Resolve the configured host:port to a socket address.
    pub fn destination(&self) -> AppResult<SocketAddr> {
        let target = format!("{}:{}", self.destination_host, self.destination_port);
        target
            .to_socket_addrs()
            .map_err(|e| {
                BatteryOscError::Configuration(format!("cannot resolve '{}': {}", target, e))
            })?
            .next()
            .ok_or_else(|| {
                BatteryOscError::Configuration(format!("'{}' resolved to no addresses", target))
            })
    }

    /// Warm-up delay as a [`Duration`].
    pub fn warm_up_delay(&self) -> Duration {
        Duration::from_secs_f64(self.warm_up_delay_secs)
    }

    /// Steady tick period as a [`Duration`].
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs_f64(self.update_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.slot_count, 6);
        assert_eq!(config.destination_port, 9000);
        assert_eq!(config.parameter_prefix, "/avatar/parameters/BatteryFloat");
        assert_eq!(config.update_interval(), Duration::from_secs(10));
        config.validate().unwrap();
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            slot_count = 4
            destination_port = 9001
            update_interval_secs = 2.5
            "#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.slot_count, 4);
        assert_eq!(config.destination_port, 9001);
        assert_eq!(config.update_interval(), Duration::from_millis(2500));
        // Untouched keys keep their defaults.
        assert_eq!(config.destination_host, "127.0.0.1");
    }

    #[test]
    fn test_env_overrides_file_and_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "battery-osc.toml",
                r#"
                slot_count = 4
                destination_port = 9001
                "#,
            )?;
            jail.set_env("BATTERY_OSC_DESTINATION_PORT", "9100");

            let config = AppConfig::load(Some(Path::new("battery-osc.toml")))
                .map_err(|e| figment::Error::from(e.to_string()))?;
            // Env beats the file, the file beats the defaults.
            assert_eq!(config.destination_port, 9100);
            assert_eq!(config.slot_count, 4);
            assert_eq!(config.destination_host, "127.0.0.1");
            Ok(())
        });
    }

    #[test]
    fn test_validate_rejects_zero_slots() {
        let config = AppConfig {
            slot_count: 0,
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(BatteryOscError::Configuration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_prefix() {
        let config = AppConfig {
            parameter_prefix: "no-leading-slash".into(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_destination_resolves_loopback() {
        let config = AppConfig::default();
        let addr = config.destination().unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 9000);
    }
}
