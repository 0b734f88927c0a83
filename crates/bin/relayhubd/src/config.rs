//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `relayhub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use relayhub_adapter_gpio::GpioConfig;
use relayhub_app::services::relay_service::TimingSettings;
use relayhub_domain::device::Device;
use relayhub_domain::id::DeviceId;
use relayhub_domain::operation::DEFAULT_MAX_DURATION_SECS;

/// Upper bound accepted for `timing.max_duration_secs` (one year).
const MAX_DURATION_LIMIT_SECS: u64 = 365 * 86_400;

/// Top-level configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Operation timing.
    pub timing: TimingConfig,
    /// Relay backend selection.
    pub relay: RelayConfig,
    /// The relays to drive, in display order.
    pub devices: Vec<DeviceConfig>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Timing configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Interval between two status refreshes, in milliseconds.
    pub tick_ms: u64,
    /// Largest accepted duration, in seconds.
    pub max_duration_secs: u64,
}

/// Which relay driver to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Linux sysfs GPIO.
    #[default]
    Gpio,
    /// In-memory relays, for hosts without GPIO.
    Simulated,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gpio" => Ok(Self::Gpio),
            "simulated" => Ok(Self::Simulated),
            other => Err(ConfigError::Validation(format!(
                "unknown relay backend {other:?}"
            ))),
        }
    }
}

/// Relay backend configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub backend: Backend,
    /// Root of the sysfs GPIO class directory.
    pub gpio_root: PathBuf,
    /// Global number of the header chip's first line; detected when unset.
    pub gpio_chip_base: Option<u32>,
}

/// One `[[devices]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    pub id: String,
    pub pin: u32,
    #[serde(default = "default_active_high")]
    pub active_high: bool,
    /// Display name; defaults to the id.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub icon: String,
}

fn default_active_high() -> bool {
    true
}

impl Config {
    /// Load configuration from `relayhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("relayhub.toml")?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("RELAYHUB_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("RELAYHUB_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("RELAYHUB_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("RELAYHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RELAYHUB_BACKEND") {
            self.relay.backend = val.parse()?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.timing.tick_ms == 0 {
            return Err(ConfigError::Validation(
                "tick_ms must be non-zero".to_string(),
            ));
        }
        if self.timing.max_duration_secs == 0 {
            return Err(ConfigError::Validation(
                "max_duration_secs must be non-zero".to_string(),
            ));
        }
        if self.timing.max_duration_secs > MAX_DURATION_LIMIT_SECS {
            return Err(ConfigError::Validation(format!(
                "max_duration_secs must not exceed {MAX_DURATION_LIMIT_SECS}"
            )));
        }
        if self.devices.is_empty() {
            return Err(ConfigError::Validation(
                "at least one device must be configured".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for device in &self.devices {
            DeviceId::new(device.id.as_str())
                .map_err(|err| ConfigError::Validation(err.to_string()))?;
            if !seen.insert(device.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "device {} is configured more than once",
                    device.id
                )));
            }
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Timing knobs for the relay service.
    #[must_use]
    pub fn timing_settings(&self) -> TimingSettings {
        TimingSettings {
            tick: Duration::from_millis(self.timing.tick_ms),
            max_duration_secs: self.timing.max_duration_secs,
        }
    }

    /// GPIO adapter configuration.
    #[must_use]
    pub fn gpio(&self) -> GpioConfig {
        GpioConfig {
            root: self.relay.gpio_root.clone(),
            chip_base: self.relay.gpio_chip_base,
        }
    }

    /// Build the domain devices from the `[[devices]]` entries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when an entry is rejected by the
    /// domain (bad id, empty label).
    pub fn devices(&self) -> Result<Vec<Device>, ConfigError> {
        self.devices
            .iter()
            .map(|entry| {
                let mut builder = Device::builder()
                    .id(entry.id.as_str())
                    .pin(entry.pin)
                    .active_high(entry.active_high)
                    .icon(entry.icon.as_str());
                if let Some(label) = &entry.label {
                    builder = builder.label(label.as_str());
                }
                builder
                    .build()
                    .map_err(|err| ConfigError::Validation(format!("device {}: {err}", entry.id)))
            })
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            timing: TimingConfig::default(),
            relay: RelayConfig::default(),
            devices: vec![
                DeviceConfig {
                    id: "air".to_string(),
                    pin: 18,
                    active_high: true,
                    label: Some("Aire".to_string()),
                    icon: "🌬️".to_string(),
                },
                DeviceConfig {
                    id: "power".to_string(),
                    pin: 23,
                    active_high: true,
                    label: Some("Electricidad".to_string()),
                    icon: "⚡".to_string(),
                },
            ],
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 666,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "relayhubd=info,relayhub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_ms: 200,
            max_duration_secs: DEFAULT_MAX_DURATION_SECS,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            gpio_root: GpioConfig::default().root,
            gpio_chip_base: None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
