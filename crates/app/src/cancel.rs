//! Per-run cancellation token.
//!
//! The dispatcher keeps the [`CancelHandle`]; the running engine holds the
//! [`CancelToken`] and checks it once per tick. Cancelling only signals:
//! the engine itself opens the relay and clears the device state.

use tokio::sync::watch;

/// Receiving side, owned by a running operation.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Check if cancellation was requested.
    ///
    /// A dropped [`CancelHandle`] counts as a request, so a run whose owner
    /// went away stops instead of running unattended.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolve once cancellation is requested.
    pub async fn cancelled(&mut self) {
        let _ = self.rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Sending side, kept alongside the device state slot.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signal the run to stop at its next tick.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Create a linked handle/token pair.
#[must_use]
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}
