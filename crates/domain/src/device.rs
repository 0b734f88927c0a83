//! Device — one controllable relay and its static wiring.

use serde::{Deserialize, Serialize};

use crate::error::{RelayHubError, ValidationError};
use crate::id::DeviceId;

/// How the relay board interprets the control line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Driving the line high closes the relay.
    #[default]
    ActiveHigh,
    /// Driving the line low closes the relay.
    ActiveLow,
}

/// Physical level written to a control line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    #[must_use]
    pub fn is_high(self) -> bool {
        matches!(self, Self::High)
    }
}

/// A relay the hub can drive. Immutable after startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    /// GPIO line number (BCM numbering on a Raspberry Pi).
    pub pin: u32,
    pub polarity: Polarity,
    pub label: String,
    pub icon: String,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::InvalidInput`] when `label` is empty.
    pub fn validate(&self) -> Result<(), RelayHubError> {
        if self.label.trim().is_empty() {
            return Err(ValidationError::EmptyLabel.into());
        }
        Ok(())
    }

    /// Level to write on the control line for the requested relay state.
    ///
    /// The line is high exactly when `closed` agrees with the polarity.
    #[must_use]
    pub fn level_for(&self, closed: bool) -> Level {
        if closed == (self.polarity == Polarity::ActiveHigh) {
            Level::High
        } else {
            Level::Low
        }
    }

    /// Level that keeps the relay open, used when initialising a pin.
    #[must_use]
    pub fn open_level(&self) -> Level {
        self.level_for(false)
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<String>,
    pin: u32,
    polarity: Polarity,
    label: Option<String>,
    icon: Option<String>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn pin(mut self, pin: u32) -> Self {
        self.pin = pin;
        self
    }

    #[must_use]
    pub fn polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }

    /// Shorthand for [`polarity`](Self::polarity) from a boolean flag.
    #[must_use]
    pub fn active_high(self, active_high: bool) -> Self {
        self.polarity(if active_high {
            Polarity::ActiveHigh
        } else {
            Polarity::ActiveLow
        })
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// When no label is given the id doubles as the label.
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::InvalidInput`] if the id is missing or
    /// malformed, or the label is blank.
    pub fn build(self) -> Result<Device, RelayHubError> {
        let id = DeviceId::new(self.id.unwrap_or_default())?;
        let label = self.label.unwrap_or_else(|| id.to_string());
        let device = Device {
            id,
            pin: self.pin,
            polarity: self.polarity,
            label,
            icon: self.icon.unwrap_or_default(),
        };
        device.validate()?;
        Ok(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(polarity: Polarity) -> Device {
        Device::builder()
            .id("air")
            .pin(18)
            .polarity(polarity)
            .label("Aire")
            .build()
            .unwrap()
    }

    #[test]
    fn should_build_valid_device() {
        let dev = Device::builder()
            .id("power")
            .pin(23)
            .label("Electricidad")
            .icon("\u{26a1}")
            .build()
            .unwrap();
        assert_eq!(dev.id.as_str(), "power");
        assert_eq!(dev.pin, 23);
        assert_eq!(dev.polarity, Polarity::ActiveHigh);
        assert_eq!(dev.icon, "\u{26a1}");
    }

    #[test]
    fn should_fall_back_to_id_when_label_missing() {
        let dev = Device::builder().id("air").build().unwrap();
        assert_eq!(dev.label, "air");
    }

    #[test]
    fn should_reject_missing_id() {
        let result = Device::builder().label("Aire").build();
        assert!(matches!(
            result,
            Err(RelayHubError::InvalidInput(ValidationError::InvalidDeviceId(_)))
        ));
    }

    #[test]
    fn should_reject_blank_label() {
        let result = Device::builder().id("air").label("  ").build();
        assert!(matches!(
            result,
            Err(RelayHubError::InvalidInput(ValidationError::EmptyLabel))
        ));
    }

    #[test]
    fn should_drive_high_to_close_active_high_relay() {
        let dev = device(Polarity::ActiveHigh);
        assert_eq!(dev.level_for(true), Level::High);
        assert_eq!(dev.level_for(false), Level::Low);
        assert_eq!(dev.open_level(), Level::Low);
    }

    #[test]
    fn should_drive_low_to_close_active_low_relay() {
        let dev = device(Polarity::ActiveLow);
        assert_eq!(dev.level_for(true), Level::Low);
        assert_eq!(dev.level_for(false), Level::High);
        assert!(dev.open_level().is_high());
    }

    #[test]
    fn should_map_active_high_flag_to_polarity() {
        let dev = Device::builder()
            .id("air")
            .active_high(false)
            .build()
            .unwrap();
        assert_eq!(dev.polarity, Polarity::ActiveLow);
    }
}
