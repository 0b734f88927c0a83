//! Device state store — the process-wide, lock-guarded state table.
//!
//! One slot per configured device. A slot is either idle or owned by exactly
//! one run, identified by its [`RunId`]. Every read and write takes the lock
//! for the duration of that access only; nothing here awaits.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use relayhub_domain::device_state::DeviceState;
use relayhub_domain::error::{BusyError, NotRunningError, RelayHubError, ValidationError};
use relayhub_domain::id::{DeviceId, RunId};

use crate::cancel::{CancelHandle, CancelToken, cancel_pair};

struct ActiveRun {
    id: RunId,
    cancel: CancelHandle,
}

struct Slot {
    id: DeviceId,
    state: DeviceState,
    run: Option<ActiveRun>,
}

impl Slot {
    fn owned_by(&self, run: RunId) -> bool {
        self.run.as_ref().is_some_and(|active| active.id == run)
    }
}

/// Shared table of [`DeviceState`]s keyed by device.
pub struct DeviceStateStore {
    slots: Mutex<HashMap<DeviceId, Slot>>,
}

impl DeviceStateStore {
    /// Create a store with one idle slot per device.
    pub fn new<'a>(devices: impl IntoIterator<Item = &'a DeviceId>) -> Self {
        let slots = devices
            .into_iter()
            .map(|id| {
                (
                    id.clone(),
                    Slot {
                        id: id.clone(),
                        state: DeviceState::idle(),
                        run: None,
                    },
                )
            })
            .collect();
        Self {
            slots: Mutex::new(slots),
        }
    }

    /// Copy of one device's state, or `None` for an unknown device.
    #[must_use]
    pub fn snapshot(&self, device: &str) -> Option<DeviceState> {
        self.lock().get(device).map(|slot| slot.state.clone())
    }

    /// Copy of every device's state, taken under a single lock acquisition.
    #[must_use]
    pub fn snapshot_all(&self) -> HashMap<DeviceId, DeviceState> {
        self.lock()
            .iter()
            .map(|(id, slot)| (id.clone(), slot.state.clone()))
            .collect()
    }

    /// Install `state` for a new run if the device is idle.
    ///
    /// The check and the transition happen under one lock acquisition, so
    /// two concurrent requests can never both succeed.
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::InvalidInput`] for an unknown device and
    /// [`RelayHubError::DeviceBusy`] when another run owns the slot. In both
    /// cases nothing is modified.
    pub fn begin(
        &self,
        device: &str,
        run: RunId,
        state: DeviceState,
    ) -> Result<CancelToken, RelayHubError> {
        let mut slots = self.lock();
        let slot = slots
            .get_mut(device)
            .ok_or_else(|| ValidationError::UnknownDevice(device.to_string()))?;
        if !slot.state.is_idle() || slot.run.is_some() {
            return Err(BusyError {
                device: slot.id.clone(),
                mode: slot.state.mode(),
            }
            .into());
        }
        let (handle, token) = cancel_pair();
        slot.state = state;
        slot.run = Some(ActiveRun {
            id: run,
            cancel: handle,
        });
        Ok(token)
    }

    /// Apply `update` to the device state if `run` still owns the slot.
    ///
    /// Returns `false` (and changes nothing) when the run lost ownership.
    pub fn update(&self, device: &str, run: RunId, update: impl FnOnce(&mut DeviceState)) -> bool {
        let mut slots = self.lock();
        match slots.get_mut(device) {
            Some(slot) if slot.owned_by(run) => {
                update(&mut slot.state);
                true
            }
            _ => false,
        }
    }

    /// Reset the slot to idle and release ownership. Only the owning run may
    /// do this; returns `false` otherwise.
    pub fn finish(&self, device: &str, run: RunId) -> bool {
        let mut slots = self.lock();
        match slots.get_mut(device) {
            Some(slot) if slot.owned_by(run) => {
                slot.state = DeviceState::idle();
                slot.run = None;
                true
            }
            _ => false,
        }
    }

    /// Signal the device's running operation to stop.
    ///
    /// The state is left untouched; the run clears it when it observes the
    /// signal.
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::InvalidInput`] for an unknown device and
    /// [`RelayHubError::NotRunning`] when the device is idle.
    pub fn request_cancel(&self, device: &str) -> Result<RunId, RelayHubError> {
        let slots = self.lock();
        let slot = slots
            .get(device)
            .ok_or_else(|| ValidationError::UnknownDevice(device.to_string()))?;
        let active = slot.run.as_ref().ok_or_else(|| NotRunningError {
            device: slot.id.clone(),
        })?;
        active.cancel.cancel();
        Ok(active.id)
    }

    /// Signal every running operation to stop. Returns how many were signalled.
    pub fn cancel_all(&self) -> usize {
        let slots = self.lock();
        slots
            .values()
            .filter_map(|slot| slot.run.as_ref())
            .inspect(|active| active.cancel.cancel())
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DeviceId, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
