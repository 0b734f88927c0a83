//! Status projection — the read-only view handed to pollers.

use serde::{Deserialize, Serialize};

use crate::device_state::{DeviceState, Mode, Phase};

/// Client-facing snapshot of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub mode: Mode,
    pub phase: Phase,
    pub seconds_left: u64,
    pub total: u64,
    /// Progress through the whole operation, 0–100.
    pub percent: u8,
}

impl From<&DeviceState> for StatusSnapshot {
    fn from(state: &DeviceState) -> Self {
        Self {
            mode: state.mode(),
            phase: state.phase(),
            seconds_left: state.seconds_left(),
            total: state.total(),
            percent: percent_complete(state.seconds_left(), state.total()),
        }
    }
}

/// `round(100 * (1 - seconds_left / total))`, clamped to `0..=100`.
///
/// Zero when `total` is zero.
#[must_use]
pub fn percent_complete(seconds_left: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let done = u128::from(total.saturating_sub(seconds_left));
    let total = u128::from(total);
    let rounded = (done * 100 + total / 2) / total;
    u8::try_from(rounded.min(100)).unwrap_or(100)
}
