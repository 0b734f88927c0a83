//! Device state — the mutable record of what a relay is currently doing.
//!
//! Invariant: a state is idle exactly when `seconds_left`, `total` and
//! `phase` are all cleared. The constructors and setters below are the
//! only way to change a state, and none of them can break the invariant.

use serde::{Deserialize, Serialize};

use crate::operation::Operation;
use crate::time::Timestamp;

/// Kind of operation currently running on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Idle,
    Single,
    Loop,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Single => f.write_str("single"),
            Self::Loop => f.write_str("loop"),
        }
    }
}

/// Half of a duty cycle the device is in.
///
/// A countdown reports [`On`](Self::On) for its whole duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    #[serde(rename = "")]
    None,
    On,
    Off,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str(""),
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
        }
    }
}

/// Current operation of one device.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceState {
    mode: Mode,
    phase: Phase,
    seconds_left: u64,
    total: u64,
    started_at: Option<Timestamp>,
}

impl DeviceState {
    /// The canonical idle record.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// State of a device that has just accepted `operation`.
    #[must_use]
    pub fn started(operation: &Operation, started_at: Timestamp) -> Self {
        let total = operation.total_seconds();
        Self {
            mode: operation.mode(),
            phase: Phase::On,
            seconds_left: total,
            total,
            started_at: Some(started_at),
        }
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn seconds_left(&self) -> u64 {
        self.seconds_left
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    #[must_use]
    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.mode == Mode::Idle
    }

    /// Switch duty-cycle phase. Ignored while idle.
    pub fn set_phase(&mut self, phase: Phase) {
        if !self.is_idle() && phase != Phase::None {
            self.phase = phase;
        }
    }

    /// Record remaining time, capped at `total`. Ignored while idle.
    pub fn set_seconds_left(&mut self, seconds_left: u64) {
        if !self.is_idle() {
            self.seconds_left = seconds_left.min(self.total);
        }
    }

    /// Whether the idle ⇔ cleared-fields invariant holds.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let cleared = self.seconds_left == 0 && self.total == 0 && self.phase == Phase::None;
        self.is_idle() == cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::now;

    fn looping() -> DeviceState {
        let op = Operation::Loop {
            on_seconds: 3,
            off_seconds: 2,
            total_seconds: 10,
        };
        DeviceState::started(&op, now())
    }

    #[test]
    fn should_start_idle_and_consistent() {
        let state = DeviceState::idle();
        assert!(state.is_idle());
        assert_eq!(state.phase(), Phase::None);
        assert!(state.started_at().is_none());
        assert!(state.is_consistent());
    }

    #[test]
    fn should_fill_fields_when_started() {
        let state = DeviceState::started(&Operation::Single { seconds: 5 }, now());
        assert_eq!(state.mode(), Mode::Single);
        assert_eq!(state.phase(), Phase::On);
        assert_eq!(state.total(), 5);
        assert_eq!(state.seconds_left(), 5);
        assert!(state.started_at().is_some());
        assert!(state.is_consistent());
    }

    #[test]
    fn should_cap_seconds_left_at_total() {
        let mut state = looping();
        state.set_seconds_left(99);
        assert_eq!(state.seconds_left(), 10);
    }

    #[test]
    fn should_ignore_updates_while_idle() {
        let mut state = DeviceState::idle();
        state.set_phase(Phase::Off);
        state.set_seconds_left(3);
        assert_eq!(state, DeviceState::idle());
    }

    #[test]
    fn should_stay_consistent_at_zero_seconds_left() {
        let mut state = looping();
        state.set_phase(Phase::Off);
        state.set_seconds_left(0);
        assert_eq!(state.phase(), Phase::Off);
        assert!(state.is_consistent());
    }

    #[test]
    fn should_serialize_phase_none_as_empty_string() {
        assert_eq!(serde_json::to_string(&Phase::None).unwrap(), "\"\"");
        assert_eq!(serde_json::to_string(&Phase::Off).unwrap(), "\"off\"");
        assert_eq!(serde_json::to_string(&Mode::Single).unwrap(), "\"single\"");
    }
}
