//! # relayhub-adapter-virtual
//!
//! Simulated relays for hosts without GPIO hardware.
//!
//! [`SimulatedRelayBank`] implements the [`RelayEffector`] port by keeping
//! the last written level of every device in memory and appending each write
//! to a log. The daemon uses it when `relay.backend = "simulated"`; the
//! integration tests use the log to check the exact write sequence.
//!
//! ## Dependency rule
//!
//! Depends on `relayhub-app` (port traits) and `relayhub-domain` only.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use relayhub_app::ports::RelayEffector;
use relayhub_domain::device::{Device, Level};
use relayhub_domain::id::DeviceId;

/// One recorded relay write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayWrite {
    pub device: DeviceId,
    pub closed: bool,
    /// Level the hardware line would have been driven to.
    pub level: Level,
}

#[derive(Default)]
struct Bank {
    closed: HashMap<DeviceId, bool>,
    log: Vec<RelayWrite>,
}

/// In-memory relay bank.
#[derive(Default)]
pub struct SimulatedRelayBank {
    inner: Mutex<Bank>,
}

impl SimulatedRelayBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the device's relay is currently closed. Never-written relays
    /// are open.
    #[must_use]
    pub fn is_closed(&self, device: &str) -> bool {
        self.lock().closed.get(device).copied().unwrap_or(false)
    }

    /// Every write so far, oldest first.
    #[must_use]
    pub fn writes(&self) -> Vec<RelayWrite> {
        self.lock().log.clone()
    }

    /// The `closed` flags written to one device, oldest first.
    #[must_use]
    pub fn writes_for(&self, device: &str) -> Vec<bool> {
        self.lock()
            .log
            .iter()
            .filter(|w| w.device.as_str() == device)
            .map(|w| w.closed)
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Bank> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RelayEffector for SimulatedRelayBank {
    fn set_relay(&self, device: &Device, closed: bool) {
        let level = device.level_for(closed);
        tracing::debug!(device = %device.id, closed, ?level, "simulated relay write");
        let mut bank = self.lock();
        bank.closed.insert(device.id.clone(), closed);
        bank.log.push(RelayWrite {
            device: device.id.clone(),
            closed,
            level,
        });
    }
}
