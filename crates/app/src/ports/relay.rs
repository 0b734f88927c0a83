//! Relay port — the write-only boundary to the physical (or simulated) relay.

use std::sync::Arc;

use relayhub_domain::device::Device;

/// Drives a relay open or closed.
///
/// Implementations map the logical request through the device polarity
/// (see [`Device::level_for`]). Writes are fire-and-forget: an adapter that
/// cannot reach its hardware logs the failure and returns, and an adapter
/// with no hardware at all does nothing.
pub trait RelayEffector: Send + Sync {
    /// Close (`true`) or open (`false`) the relay of `device`.
    fn set_relay(&self, device: &Device, closed: bool);
}

impl<T: RelayEffector + ?Sized> RelayEffector for Arc<T> {
    fn set_relay(&self, device: &Device, closed: bool) {
        (**self).set_relay(device, closed);
    }
}
