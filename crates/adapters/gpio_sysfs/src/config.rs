//! GPIO adapter configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// Configuration for the sysfs GPIO relay adapter.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GpioConfig {
    /// Root of the sysfs GPIO class directory.
    pub root: PathBuf,
    /// Global number of the header chip's first line. Detected from the
    /// `gpiochip*` entries under `root` when unset.
    pub chip_base: Option<u32>,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/sys/class/gpio"),
            chip_base: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_sysfs_class_dir() {
        let config = GpioConfig::default();
        assert_eq!(config.root, PathBuf::from("/sys/class/gpio"));
        assert_eq!(config.chip_base, None);
    }

    #[test]
    fn should_deserialize_from_toml() {
        let config: GpioConfig = toml::from_str(
            r#"
            root = "/tmp/gpio"
            chip_base = 512
            "#,
        )
        .unwrap();
        assert_eq!(config.root, PathBuf::from("/tmp/gpio"));
        assert_eq!(config.chip_base, Some(512));
    }

    #[test]
    fn should_use_defaults_for_missing_fields() {
        let config: GpioConfig = toml::from_str("").unwrap();
        assert_eq!(config.root, PathBuf::from("/sys/class/gpio"));
    }
}
