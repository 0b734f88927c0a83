//! Shared application state for axum handlers.

use std::sync::Arc;

use relayhub_app::ports::RelayEffector;
use relayhub_app::services::relay_service::RelayService;

/// Application state shared across all axum handlers.
///
/// Generic over the relay effector to avoid dynamic dispatch. `Clone` is
/// implemented manually so `E` does not need to be `Clone`.
pub struct AppState<E> {
    pub relay_service: Arc<RelayService<E>>,
}

impl<E> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self {
            relay_service: Arc::clone(&self.relay_service),
        }
    }
}

impl<E> AppState<E>
where
    E: RelayEffector + 'static,
{
    pub fn new(relay_service: RelayService<E>) -> Self {
        Self::from_arc(Arc::new(relay_service))
    }

    /// Create a state around a service the daemon also keeps for shutdown.
    pub fn from_arc(relay_service: Arc<RelayService<E>>) -> Self {
        Self { relay_service }
    }
}
