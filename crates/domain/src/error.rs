//! Common error types used across the workspace.
//!
//! Each failure kind has its own typed error; [`RelayHubError`] wraps them
//! with `#[from]` conversions so callers can use `?` throughout.

use crate::device_state::Mode;
use crate::id::DeviceId;

/// Top-level error returned by relayhub operations.
#[derive(Debug, thiserror::Error)]
pub enum RelayHubError {
    /// The request was malformed: unknown device, bad duration, bad config.
    #[error("invalid input")]
    InvalidInput(#[from] ValidationError),

    /// An operation is already running on the target device.
    #[error("device busy")]
    DeviceBusy(#[from] BusyError),

    /// A cancel was requested for a device with nothing running.
    #[error("no operation running")]
    NotRunning(#[from] NotRunningError),
}

/// Input or configuration rejected before any state was touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown device: {0}")]
    UnknownDevice(String),

    #[error("{field} must be a positive number of seconds")]
    NonPositiveDuration { field: &'static str },

    #[error("{field} must not exceed {max} seconds")]
    DurationTooLong { field: &'static str, max: u64 },

    #[error("invalid device id {0:?}: expected lowercase letters, digits, '-' or '_'")]
    InvalidDeviceId(String),

    #[error("device label must not be empty")]
    EmptyLabel,

    #[error("device {0} is configured more than once")]
    DuplicateDevice(String),

    #[error("at least one device must be configured")]
    NoDevices,
}

/// The device already has an active operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("device {device} is busy running a {mode} operation")]
pub struct BusyError {
    pub device: DeviceId,
    pub mode: Mode,
}

/// The device is idle, so there is nothing to cancel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("device {device} has no running operation")]
pub struct NotRunningError {
    pub device: DeviceId,
}
