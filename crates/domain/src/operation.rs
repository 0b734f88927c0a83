//! Operation — a timed activation pattern requested for one device.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::device_state::Mode;
use crate::error::ValidationError;

/// Default upper bound for any single duration field: one day.
pub const DEFAULT_MAX_DURATION_SECS: u64 = 24 * 60 * 60;

/// A timed activation pattern.
///
/// Values built through [`Operation::single`] and [`Operation::duty_cycle`]
/// are validated. The timing engine still tolerates hand-built loops with a
/// zero-length phase by skipping that phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    /// Close the relay for `seconds`, then open it.
    Single { seconds: u64 },
    /// Alternate closed/open phases until `total_seconds` have elapsed.
    Loop {
        on_seconds: u64,
        off_seconds: u64,
        total_seconds: u64,
    },
}

impl Operation {
    /// Build a validated countdown.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NonPositiveDuration`] when `seconds` is 0
    /// and [`ValidationError::DurationTooLong`] when it exceeds `max_secs`.
    pub fn single(seconds: u64, max_secs: u64) -> Result<Self, ValidationError> {
        check_duration("seconds", seconds, max_secs)?;
        Ok(Self::Single { seconds })
    }

    /// Build a validated duty-cycle loop.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NonPositiveDuration`] when any field is 0
    /// and [`ValidationError::DurationTooLong`] when any exceeds `max_secs`.
    pub fn duty_cycle(
        on_seconds: u64,
        off_seconds: u64,
        total_seconds: u64,
        max_secs: u64,
    ) -> Result<Self, ValidationError> {
        check_duration("on_seconds", on_seconds, max_secs)?;
        check_duration("off_seconds", off_seconds, max_secs)?;
        check_duration("total_seconds", total_seconds, max_secs)?;
        Ok(Self::Loop {
            on_seconds,
            off_seconds,
            total_seconds,
        })
    }

    /// Device mode while this operation is running.
    #[must_use]
    pub fn mode(&self) -> Mode {
        match self {
            Self::Single { .. } => Mode::Single,
            Self::Loop { .. } => Mode::Loop,
        }
    }

    /// Full duration of the operation in seconds.
    #[must_use]
    pub fn total_seconds(&self) -> u64 {
        match self {
            Self::Single { seconds } => *seconds,
            Self::Loop { total_seconds, .. } => *total_seconds,
        }
    }

    #[must_use]
    pub fn total(&self) -> Duration {
        Duration::from_secs(self.total_seconds())
    }
}

fn check_duration(field: &'static str, value: u64, max: u64) -> Result<(), ValidationError> {
    if value == 0 {
        return Err(ValidationError::NonPositiveDuration { field });
    }
    if value > max {
        return Err(ValidationError::DurationTooLong { field, max });
    }
    Ok(())
}
