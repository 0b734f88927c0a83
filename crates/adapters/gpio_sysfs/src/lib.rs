//! # relayhub-adapter-gpio
//!
//! Relay driver backed by the Linux sysfs GPIO interface.
//!
//! Device pins use BCM numbering, the offset within the header GPIO chip.
//! Sysfs numbers lines globally, so each pin is shifted by the chip's base
//! (0 on older kernels, 512 or more on current Raspberry Pi kernels). The base
//! comes from configuration or from the `gpiochip*/base` entries.
//!
//! Each line is exported under `<root>/gpio<N>` and configured as an output
//! already holding its open level, so relays never chatter at startup.
//! Writes then go to `<root>/gpio<N>/value`.
//!
//! When the GPIO class directory does not exist (a development machine, a
//! container) the driver runs disabled: every write is accepted and dropped.
//!
//! ## Dependency rule
//!
//! Depends on `relayhub-app` (port traits) and `relayhub-domain` only.

pub mod config;
pub mod error;

use std::fs;
use std::path::{Path, PathBuf};

use relayhub_app::ports::RelayEffector;
use relayhub_domain::device::{Device, Level};

pub use config::GpioConfig;
pub use error::GpioError;

/// Sysfs GPIO relay driver.
#[derive(Debug)]
pub struct SysfsGpioRelay {
    root: PathBuf,
    enabled: bool,
    chip_base: u32,
}

impl SysfsGpioRelay {
    /// Open the configured GPIO root and resolve the header chip base.
    #[must_use]
    pub fn new(config: &GpioConfig) -> Self {
        let enabled = config.root.is_dir();
        if !enabled {
            tracing::warn!(
                root = %config.root.display(),
                "GPIO controller not found, relay writes will be ignored"
            );
        }
        let chip_base = match config.chip_base {
            Some(base) => base,
            None if enabled => detect_chip_base(&config.root),
            None => 0,
        };
        if enabled {
            tracing::info!(root = %config.root.display(), chip_base, "GPIO controller found");
        }
        Self {
            root: config.root.clone(),
            enabled,
            chip_base,
        }
    }

    /// Whether writes reach hardware.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Global sysfs number of a BCM pin.
    #[must_use]
    pub fn line(&self, pin: u32) -> u32 {
        self.chip_base.saturating_add(pin)
    }

    /// Export every device pin and drive it to its open level.
    ///
    /// # Errors
    ///
    /// Returns [`GpioError::Io`] when a pin cannot be exported or configured.
    #[tracing::instrument(skip_all, fields(devices = devices.len()))]
    pub fn setup(&self, devices: &[Device]) -> Result<(), GpioError> {
        if !self.enabled {
            return Ok(());
        }
        for device in devices {
            let line = self.line(device.pin);
            self.export(line)?;
            let direction = match device.open_level() {
                Level::High => "high",
                Level::Low => "low",
            };
            write_attr(&self.line_dir(line).join("direction"), direction)?;
            tracing::info!(device = %device.id, pin = device.pin, line, direction, "relay pin ready");
        }
        Ok(())
    }

    fn line_dir(&self, line: u32) -> PathBuf {
        self.root.join(format!("gpio{line}"))
    }

    fn export(&self, line: u32) -> Result<(), GpioError> {
        if self.line_dir(line).exists() {
            tracing::debug!(line, "line already exported");
            return Ok(());
        }
        write_attr(&self.root.join("export"), &line.to_string())
    }

    fn write_level(&self, pin: u32, level: Level) -> Result<(), GpioError> {
        let value = if level.is_high() { "1" } else { "0" };
        write_attr(&self.line_dir(self.line(pin)).join("value"), value)
    }
}

impl RelayEffector for SysfsGpioRelay {
    fn set_relay(&self, device: &Device, closed: bool) {
        if !self.enabled {
            return;
        }
        let level = device.level_for(closed);
        match self.write_level(device.pin, level) {
            Ok(()) => tracing::debug!(device = %device.id, pin = device.pin, closed, "relay written"),
            Err(err) => tracing::warn!(
                device = %device.id,
                pin = device.pin,
                closed,
                error = %err,
                "relay write failed"
            ),
        }
    }
}

/// Base of the header chip: the lowest `pinctrl-*` chip, else the lowest
/// chip, else 0 when no chip is listed.
fn detect_chip_base(root: &Path) -> u32 {
    let Ok(entries) = fs::read_dir(root) else {
        return 0;
    };
    let chips: Vec<(u32, String)> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("gpiochip"))
        .filter_map(|entry| {
            let base = fs::read_to_string(entry.path().join("base"))
                .ok()?
                .trim()
                .parse()
                .ok()?;
            let label = fs::read_to_string(entry.path().join("label"))
                .map(|label| label.trim().to_string())
                .unwrap_or_default();
            Some((base, label))
        })
        .collect();

    chips
        .iter()
        .filter(|(_, label)| label.starts_with("pinctrl-"))
        .map(|(base, _)| *base)
        .min()
        .or_else(|| chips.iter().map(|(base, _)| *base).min())
        .unwrap_or(0)
}

fn write_attr(path: &Path, value: &str) -> Result<(), GpioError> {
    fs::write(path, value).map_err(|source| GpioError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayhub_domain::device::Polarity;

    struct TempRoot(PathBuf);

    impl TempRoot {
        fn new() -> Self {
            let path = std::env::temp_dir().join(format!("relayhub-gpio-{}", uuid::Uuid::new_v4()));
            fs::create_dir_all(&path).unwrap();
            Self(path)
        }

        fn with_pins(pins: &[u32]) -> Self {
            let root = Self::new();
            for pin in pins {
                fs::create_dir_all(root.0.join(format!("gpio{pin}"))).unwrap();
            }
            root
        }

        fn read(&self, rel: &str) -> String {
            fs::read_to_string(self.0.join(rel)).unwrap()
        }

        fn with_chip(self, name: &str, base: u32, label: &str) -> Self {
            let chip = self.0.join(name);
            fs::create_dir_all(&chip).unwrap();
            fs::write(chip.join("base"), format!("{base}\n")).unwrap();
            fs::write(chip.join("label"), format!("{label}\n")).unwrap();
            self
        }

        fn driver(&self) -> SysfsGpioRelay {
            SysfsGpioRelay::new(&GpioConfig {
                root: self.0.clone(),
                chip_base: None,
            })
        }
    }

    impl Drop for TempRoot {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    fn device(id: &str, pin: u32, polarity: Polarity) -> Device {
        Device::builder()
            .id(id)
            .pin(pin)
            .polarity(polarity)
            .build()
            .unwrap()
    }

    #[test]
    fn should_be_disabled_without_gpio_root() {
        let driver = SysfsGpioRelay::new(&GpioConfig {
            root: std::env::temp_dir().join(format!("relayhub-missing-{}", uuid::Uuid::new_v4())),
            chip_base: None,
        });
        assert!(!driver.is_enabled());
        assert!(driver.setup(&[device("air", 18, Polarity::ActiveHigh)]).is_ok());
        driver.set_relay(&device("air", 18, Polarity::ActiveHigh), true);
    }

    #[test]
    fn should_configure_active_high_pin_low() {
        let root = TempRoot::with_pins(&[18]);
        let driver = root.driver();
        assert!(driver.is_enabled());

        driver.setup(&[device("air", 18, Polarity::ActiveHigh)]).unwrap();

        assert_eq!(root.read("gpio18/direction"), "low");
    }

    #[test]
    fn should_configure_active_low_pin_high() {
        let root = TempRoot::with_pins(&[23]);
        root.driver()
            .setup(&[device("power", 23, Polarity::ActiveLow)])
            .unwrap();

        assert_eq!(root.read("gpio23/direction"), "high");
    }

    #[test]
    fn should_export_missing_pin() {
        let root = TempRoot::new();
        root.driver().export(17).unwrap();
        assert_eq!(root.read("export"), "17");
    }

    #[test]
    fn should_fail_setup_when_pin_cannot_be_configured() {
        let root = TempRoot::new();
        let err = root
            .driver()
            .setup(&[device("air", 18, Polarity::ActiveHigh)])
            .unwrap_err();
        assert!(matches!(err, GpioError::Io { .. }));
    }

    #[test]
    fn should_write_level_through_polarity() {
        let root = TempRoot::with_pins(&[18, 23]);
        let driver = root.driver();
        let air = device("air", 18, Polarity::ActiveHigh);
        let power = device("power", 23, Polarity::ActiveLow);

        driver.set_relay(&air, true);
        driver.set_relay(&power, true);
        assert_eq!(root.read("gpio18/value"), "1");
        assert_eq!(root.read("gpio23/value"), "0");

        driver.set_relay(&air, false);
        driver.set_relay(&power, false);
        assert_eq!(root.read("gpio18/value"), "0");
        assert_eq!(root.read("gpio23/value"), "1");
    }

    #[test]
    fn should_keep_going_when_write_fails() {
        let root = TempRoot::new();
        let driver = root.driver();
        // gpio5 was never exported, so the value file's parent is missing.
        driver.set_relay(&device("fan", 5, Polarity::ActiveHigh), true);
        assert!(!root.0.join("gpio5/value").exists());
    }

    #[test]
    fn should_use_base_zero_without_chip_entries() {
        let root = TempRoot::new();
        assert_eq!(root.driver().line(18), 18);
    }

    #[test]
    fn should_offset_pins_by_header_chip_base() {
        let root = TempRoot::with_pins(&[530])
            .with_chip("gpiochip512", 512, "pinctrl-bcm2711")
            .with_chip("gpiochip570", 570, "raspberrypi-exp-gpio");
        let driver = root.driver();
        let air = device("air", 18, Polarity::ActiveHigh);

        driver.setup(std::slice::from_ref(&air)).unwrap();
        driver.set_relay(&air, true);

        assert_eq!(root.read("gpio530/direction"), "low");
        assert_eq!(root.read("gpio530/value"), "1");
        assert!(!root.0.join("gpio18").exists());
    }

    #[test]
    fn should_export_global_line_number() {
        let root = TempRoot::new().with_chip("gpiochip512", 512, "pinctrl-bcm2711");
        let driver = root.driver();
        driver.export(driver.line(23)).unwrap();
        assert_eq!(root.read("export"), "535");
    }

    #[test]
    fn should_pick_pinctrl_chip_over_lower_bases() {
        let root = TempRoot::new()
            .with_chip("gpiochip512", 512, "gpio-brcmstb@107d508500")
            .with_chip("gpiochip571", 571, "pinctrl-rp1");
        assert_eq!(root.driver().line(18), 589);
    }

    #[test]
    fn should_prefer_configured_chip_base() {
        let root = TempRoot::new().with_chip("gpiochip512", 512, "pinctrl-bcm2711");
        let driver = SysfsGpioRelay::new(&GpioConfig {
            root: root.0.clone(),
            chip_base: Some(0),
        });
        assert_eq!(driver.line(18), 18);
    }
}
