//! Relay service — accepts operation requests and reports device status.
//!
//! Starting an operation validates the request, installs the started state
//! synchronously (so a status read right after a successful start already
//! sees it) and spawns a [`TimingEngine`] run on the tokio runtime. Requests
//! for a busy device are rejected; nothing is queued or preempted.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use relayhub_domain::device::Device;
use relayhub_domain::device_state::DeviceState;
use relayhub_domain::error::{RelayHubError, ValidationError};
use relayhub_domain::id::{DeviceId, RunId};
use relayhub_domain::operation::{DEFAULT_MAX_DURATION_SECS, Operation};
use relayhub_domain::status::StatusSnapshot;
use relayhub_domain::time::now;

use crate::ports::RelayEffector;
use crate::state_store::DeviceStateStore;
use crate::timing_engine::{DEFAULT_TICK, Run, TimingEngine};

/// Timing knobs for the service.
#[derive(Debug, Clone, Copy)]
pub struct TimingSettings {
    /// Interval between two state refreshes of a running operation.
    pub tick: Duration,
    /// Largest accepted value for any duration field, in seconds.
    pub max_duration_secs: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            max_duration_secs: DEFAULT_MAX_DURATION_SECS,
        }
    }
}

/// Status of one device, tagged with its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
    pub device: DeviceId,
    pub status: StatusSnapshot,
}

/// Application service driving every configured relay.
pub struct RelayService<E> {
    devices: Vec<Device>,
    store: Arc<DeviceStateStore>,
    engine: Arc<TimingEngine<E>>,
    settings: TimingSettings,
    runs: Mutex<Vec<JoinHandle<()>>>,
}

impl<E> RelayService<E>
where
    E: RelayEffector + 'static,
{
    /// Create a service for `devices`, all starting idle.
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::InvalidInput`] when `devices` is empty, a
    /// device is invalid, or two devices share an id.
    pub fn new(
        devices: Vec<Device>,
        effector: E,
        settings: TimingSettings,
    ) -> Result<Self, RelayHubError> {
        if devices.is_empty() {
            return Err(ValidationError::NoDevices.into());
        }
        let mut seen = HashSet::new();
        for device in &devices {
            device.validate()?;
            if !seen.insert(&device.id) {
                return Err(ValidationError::DuplicateDevice(device.id.to_string()).into());
            }
        }

        let store = Arc::new(DeviceStateStore::new(devices.iter().map(|d| &d.id)));
        let engine = Arc::new(TimingEngine::new(
            Arc::clone(&store),
            effector,
            settings.tick,
        ));
        Ok(Self {
            devices,
            store,
            engine,
            settings,
            runs: Mutex::new(Vec::new()),
        })
    }

    /// Configured devices, in configuration order.
    #[must_use]
    pub fn list_devices(&self) -> &[Device] {
        &self.devices
    }

    /// Snapshot of one device.
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::InvalidInput`] for an unknown device.
    pub fn status(&self, device: &str) -> Result<StatusSnapshot, RelayHubError> {
        self.store
            .snapshot(device)
            .map(|state| StatusSnapshot::from(&state))
            .ok_or_else(|| ValidationError::UnknownDevice(device.to_string()).into())
    }

    /// Snapshot of every device, in configuration order.
    #[must_use]
    pub fn status_all(&self) -> Vec<DeviceStatus> {
        let states = self.store.snapshot_all();
        self.devices
            .iter()
            .filter_map(|device| {
                states.get(&device.id).map(|state| DeviceStatus {
                    device: device.id.clone(),
                    status: StatusSnapshot::from(state),
                })
            })
            .collect()
    }

    /// Close the relay for `seconds`, then open it.
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::InvalidInput`] for an unknown device or an
    /// out-of-range duration, and [`RelayHubError::DeviceBusy`] when the
    /// device is already running an operation.
    #[tracing::instrument(skip(self))]
    pub fn start_single(&self, device: &str, seconds: u64) -> Result<RunId, RelayHubError> {
        let operation = Operation::single(seconds, self.settings.max_duration_secs)?;
        self.start(device, operation)
    }

    /// Alternate `on_seconds` closed / `off_seconds` open until
    /// `total_seconds` have elapsed.
    ///
    /// # Errors
    ///
    /// Same as [`start_single`](Self::start_single).
    #[tracing::instrument(skip(self))]
    pub fn start_loop(
        &self,
        device: &str,
        on_seconds: u64,
        off_seconds: u64,
        total_seconds: u64,
    ) -> Result<RunId, RelayHubError> {
        let operation = Operation::duty_cycle(
            on_seconds,
            off_seconds,
            total_seconds,
            self.settings.max_duration_secs,
        )?;
        self.start(device, operation)
    }

    /// Ask the device's running operation to stop.
    ///
    /// Returns as soon as the signal is sent; the run opens the relay and
    /// returns the device to idle within one tick.
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::InvalidInput`] for an unknown device and
    /// [`RelayHubError::NotRunning`] when the device is idle.
    #[tracing::instrument(skip(self))]
    pub fn cancel(&self, device: &str) -> Result<(), RelayHubError> {
        let run_id = self.store.request_cancel(device)?;
        tracing::info!(%run_id, "cancellation requested");
        Ok(())
    }

    /// Cancel every running operation and wait until each has opened its
    /// relay and returned to idle.
    pub async fn shutdown(&self) {
        let cancelled = self.store.cancel_all();
        let runs = std::mem::take(&mut *self.lock_runs());
        tracing::info!(cancelled, "shutting down relay operations");
        for handle in runs {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "relay operation task failed");
            }
        }
    }

    fn start(&self, device: &str, operation: Operation) -> Result<RunId, RelayHubError> {
        let target = self
            .devices
            .iter()
            .find(|d| d.id.as_str() == device)
            .ok_or_else(|| ValidationError::UnknownDevice(device.to_string()))?
            .clone();

        let id = RunId::new();
        let started = Instant::now();
        let cancel = self
            .store
            .begin(device, id, DeviceState::started(&operation, now()))?;

        let run = Run {
            id,
            device: target,
            operation,
            started,
            cancel,
        };
        let engine = Arc::clone(&self.engine);
        let handle = tokio::spawn(async move {
            engine.run(run).await;
        });

        let mut runs = self.lock_runs();
        runs.retain(|h| !h.is_finished());
        runs.push(handle);

        tracing::info!(%id, ?operation, "relay operation started");
        Ok(id)
    }

    fn lock_runs(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
