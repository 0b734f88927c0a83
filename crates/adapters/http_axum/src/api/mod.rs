//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod devices;
#[allow(clippy::missing_errors_doc)]
pub mod operations;
#[allow(clippy::missing_errors_doc)]
pub mod status;

use axum::Router;
use axum::routing::{get, post};

use relayhub_app::ports::RelayEffector;

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<E>() -> Router<AppState<E>>
where
    E: RelayEffector + 'static,
{
    Router::new()
        // Devices
        .route("/devices", get(devices::list::<E>))
        .route("/devices/{id}/cancel", post(operations::cancel::<E>))
        // Status
        .route("/status", get(status::list::<E>))
        .route("/status/{id}", get(status::get::<E>))
        // Operations
        .route("/single", post(operations::single::<E>))
        .route("/loop", post(operations::duty_cycle::<E>))
}
