//! Relay backend selection.

use relayhub_adapter_gpio::{GpioError, SysfsGpioRelay};
use relayhub_adapter_virtual::SimulatedRelayBank;
use relayhub_app::ports::RelayEffector;
use relayhub_domain::device::Device;

use crate::config::{Backend, Config};

/// The relay driver chosen at startup.
pub enum RelayBackend {
    Gpio(SysfsGpioRelay),
    Simulated(SimulatedRelayBank),
}

impl RelayBackend {
    /// Build the configured backend and bring every relay to its open state.
    ///
    /// # Errors
    ///
    /// Returns [`GpioError`] when a GPIO pin cannot be exported or
    /// configured.
    pub fn open(config: &Config, devices: &[Device]) -> Result<Self, GpioError> {
        match config.relay.backend {
            Backend::Gpio => {
                let gpio = SysfsGpioRelay::new(&config.gpio());
                gpio.setup(devices)?;
                tracing::info!(enabled = gpio.is_enabled(), "using sysfs GPIO relays");
                Ok(Self::Gpio(gpio))
            }
            Backend::Simulated => {
                tracing::info!("using simulated relays");
                Ok(Self::Simulated(SimulatedRelayBank::new()))
            }
        }
    }

    /// Drive every relay open.
    pub fn open_all(&self, devices: &[Device]) {
        for device in devices {
            self.set_relay(device, false);
        }
    }
}

impl RelayEffector for RelayBackend {
    fn set_relay(&self, device: &Device, closed: bool) {
        match self {
            Self::Gpio(gpio) => gpio.set_relay(device, closed),
            Self::Simulated(bank) => bank.set_relay(device, closed),
        }
    }
}
