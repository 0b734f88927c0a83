//! JSON handlers for device status snapshots.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::ser::{Serialize, SerializeMap, Serializer};

use relayhub_app::ports::RelayEffector;
use relayhub_app::services::relay_service::DeviceStatus;
use relayhub_domain::status::StatusSnapshot;

use crate::error::ApiError;
use crate::state::AppState;

/// Snapshots keyed by device id, serialized in configuration order.
pub struct StatusMap(Vec<DeviceStatus>);

impl Serialize for StatusMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in &self.0 {
            map.serialize_entry(entry.device.as_str(), &entry.status)?;
        }
        map.end()
    }
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<StatusMap>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<StatusSnapshot>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/status`
pub async fn list<E>(State(state): State<AppState<E>>) -> ListResponse
where
    E: RelayEffector + 'static,
{
    let statuses = StatusMap(state.relay_service.status_all());
    ListResponse::Ok(Json(statuses))
}

/// `GET /api/status/{id}`
pub async fn get<E>(
    State(state): State<AppState<E>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    E: RelayEffector + 'static,
{
    let snapshot = state.relay_service.status(&id)?;
    Ok(GetResponse::Ok(Json(snapshot)))
}
