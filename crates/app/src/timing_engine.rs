//! Timing engine — drives one relay through a timed operation.
//!
//! A run holds the relay closed or open for bounded phases, refreshing
//! `seconds_left` in the shared [`DeviceStateStore`] once per tick. Time is
//! measured on the monotonic tokio clock against an absolute deadline fixed
//! when the operation was accepted.
//!
//! Whatever ends a run (deadline, cancellation, lost ownership) the close-out
//! is the same: open the relay, then reset the slot to idle.

use std::sync::Arc;
use std::time::Duration;

use relayhub_domain::device::Device;
use relayhub_domain::device_state::Phase;
use relayhub_domain::id::RunId;
use relayhub_domain::operation::Operation;
use relayhub_domain::time::whole_seconds_left;
use tokio::time::Instant;

use crate::cancel::CancelToken;
use crate::ports::RelayEffector;
use crate::state_store::DeviceStateStore;

/// Default interval between two state refreshes of a running operation.
pub const DEFAULT_TICK: Duration = Duration::from_millis(200);

/// An accepted operation, ready to be driven.
#[derive(Debug)]
pub struct Run {
    pub id: RunId,
    pub device: Device,
    pub operation: Operation,
    /// Instant the operation was accepted; the deadline is measured from here.
    pub started: Instant,
    pub cancel: CancelToken,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The deadline passed.
    Completed,
    /// A cancellation was requested.
    Cancelled,
    /// The state slot no longer belongs to this run.
    Superseded,
}

/// Result of holding a phase.
enum Hold {
    Elapsed,
    Stop(Outcome),
}

/// Runs operations against a relay effector and the shared state store.
pub struct TimingEngine<E> {
    store: Arc<DeviceStateStore>,
    effector: E,
    tick: Duration,
}

impl<E: RelayEffector> TimingEngine<E> {
    /// Create an engine refreshing state every `tick`.
    pub fn new(store: Arc<DeviceStateStore>, effector: E, tick: Duration) -> Self {
        Self {
            store,
            effector,
            tick,
        }
    }

    /// Drive `run` to completion.
    ///
    /// The slot must already hold the run's started state (the dispatcher
    /// installs it before spawning). On return the relay is open and, unless
    /// the run was superseded, the slot is idle. The same close-out runs if
    /// the run panics or its task is aborted.
    #[tracing::instrument(skip_all, fields(device = %run.device.id, run_id = %run.id))]
    pub async fn run(&self, mut run: Run) -> Outcome {
        let mut close_out = CloseOut {
            engine: self,
            device: run.device.clone(),
            run_id: run.id,
            release_slot: true,
        };
        let deadline = run
            .started
            .checked_add(run.operation.total())
            .unwrap_or_else(|| far_future(run.started));
        let outcome = match run.operation {
            Operation::Single { .. } => self.countdown(&mut run, deadline).await,
            Operation::Loop {
                on_seconds,
                off_seconds,
                ..
            } => {
                self.duty_cycle(
                    &mut run,
                    deadline,
                    Duration::from_secs(on_seconds),
                    Duration::from_secs(off_seconds),
                )
                .await
            }
        };

        close_out.release_slot = outcome != Outcome::Superseded;
        drop(close_out);
        tracing::info!(?outcome, "relay operation finished");
        outcome
    }

    async fn countdown(&self, run: &mut Run, deadline: Instant) -> Outcome {
        self.effector.set_relay(&run.device, true);
        match self.hold(run, deadline, deadline).await {
            Hold::Elapsed => Outcome::Completed,
            Hold::Stop(outcome) => outcome,
        }
    }

    async fn duty_cycle(
        &self,
        run: &mut Run,
        deadline: Instant,
        on: Duration,
        off: Duration,
    ) -> Outcome {
        if on.is_zero() && off.is_zero() {
            // Nothing to alternate: the relay stays open until the deadline.
            if !self
                .store
                .update(run.device.id.as_str(), run.id, |state| {
                    state.set_phase(Phase::Off);
                })
            {
                return Outcome::Superseded;
            }
            return match self.hold(run, deadline, deadline).await {
                Hold::Elapsed => Outcome::Completed,
                Hold::Stop(outcome) => outcome,
            };
        }

        loop {
            for (phase, length) in [(Phase::On, on), (Phase::Off, off)] {
                if length.is_zero() {
                    continue;
                }
                if Instant::now() >= deadline {
                    return Outcome::Completed;
                }
                if let Some(outcome) = self.enter_phase(run, phase) {
                    return outcome;
                }
                let phase_end = Instant::now()
                    .checked_add(length)
                    .map_or(deadline, |end| end.min(deadline));
                if let Hold::Stop(outcome) = self.hold(run, phase_end, deadline).await {
                    return outcome;
                }
            }
        }
    }

    /// Record the new phase and switch the relay. Returns an outcome when the
    /// run must stop instead.
    fn enter_phase(&self, run: &Run, phase: Phase) -> Option<Outcome> {
        if run.cancel.is_cancelled() {
            return Some(Outcome::Cancelled);
        }
        if !self
            .store
            .update(run.device.id.as_str(), run.id, |state| state.set_phase(phase))
        {
            return Some(Outcome::Superseded);
        }
        tracing::debug!(%phase, "entering phase");
        self.effector.set_relay(&run.device, phase == Phase::On);
        None
    }

    /// Tick until `until`, refreshing the time left before `deadline`.
    async fn hold(&self, run: &mut Run, until: Instant, deadline: Instant) -> Hold {
        loop {
            if run.cancel.is_cancelled() {
                return Hold::Stop(Outcome::Cancelled);
            }
            let now = Instant::now();
            let left = whole_seconds_left(deadline.saturating_duration_since(now));
            if !self
                .store
                .update(run.device.id.as_str(), run.id, |state| {
                    state.set_seconds_left(left);
                })
            {
                return Hold::Stop(Outcome::Superseded);
            }
            if now >= until {
                return Hold::Elapsed;
            }
            let wake = now.checked_add(self.tick).map_or(until, |t| t.min(until));
            tokio::select! {
                () = tokio::time::sleep_until(wake) => {}
                () = run.cancel.cancelled() => {}
            }
        }
    }
}

/// Opens the relay and releases the slot when dropped, so a run that
/// panics or is aborted never leaves its device closed or busy.
struct CloseOut<'a, E: RelayEffector> {
    engine: &'a TimingEngine<E>,
    device: Device,
    run_id: RunId,
    release_slot: bool,
}

impl<E: RelayEffector> Drop for CloseOut<'_, E> {
    fn drop(&mut self) {
        self.engine.effector.set_relay(&self.device, false);
        if self.release_slot {
            self.engine.store.finish(self.device.id.as_str(), self.run_id);
        }
    }
}

/// A deadline no operation reaches, for durations past the clock's range.
fn far_future(from: Instant) -> Instant {
    const FAR: Duration = Duration::from_secs(86_400 * 365 * 30);
    from.checked_add(FAR).unwrap_or(from)
}
