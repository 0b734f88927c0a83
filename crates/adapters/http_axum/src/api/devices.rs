//! JSON handlers for the configured devices.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use relayhub_app::ports::RelayEffector;
use relayhub_domain::device::Device;
use relayhub_domain::id::DeviceId;

use crate::state::AppState;

/// Public view of a device. Pin and polarity stay server-side.
#[derive(Debug, Serialize)]
pub struct DeviceSummary {
    pub id: DeviceId,
    pub label: String,
    pub icon: String,
}

impl From<&Device> for DeviceSummary {
    fn from(device: &Device) -> Self {
        Self {
            id: device.id.clone(),
            label: device.label.clone(),
            icon: device.icon.clone(),
        }
    }
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<DeviceSummary>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/devices`
pub async fn list<E>(State(state): State<AppState<E>>) -> ListResponse
where
    E: RelayEffector + 'static,
{
    let devices = state
        .relay_service
        .list_devices()
        .iter()
        .map(DeviceSummary::from)
        .collect();
    ListResponse::Ok(Json(devices))
}
