//! JSON handlers that start and cancel relay operations.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use relayhub_app::ports::RelayEffector;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for a single countdown.
#[derive(Debug, Deserialize)]
pub struct SingleRequest {
    pub device: String,
    pub seconds: u64,
}

/// Request body for a duty cycle.
#[derive(Debug, Deserialize)]
pub struct LoopRequest {
    pub device: String,
    pub on_seconds: u64,
    pub off_seconds: u64,
    pub total_seconds: u64,
}

#[derive(Serialize)]
struct Ack {
    ok: bool,
}

/// Possible responses from the start endpoints.
pub enum StartResponse {
    Started,
}

impl IntoResponse for StartResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Started => Json(Ack { ok: true }).into_response(),
        }
    }
}

/// Possible responses from the cancel endpoint.
pub enum CancelResponse {
    Accepted,
}

impl IntoResponse for CancelResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted => (StatusCode::ACCEPTED, Json(Ack { ok: true })).into_response(),
        }
    }
}

/// `POST /api/single`
pub async fn single<E>(
    State(state): State<AppState<E>>,
    body: Result<Json<SingleRequest>, JsonRejection>,
) -> Result<StartResponse, ApiError>
where
    E: RelayEffector + 'static,
{
    let Json(req) = body?;
    state.relay_service.start_single(&req.device, req.seconds)?;
    Ok(StartResponse::Started)
}

/// `POST /api/loop`
pub async fn duty_cycle<E>(
    State(state): State<AppState<E>>,
    body: Result<Json<LoopRequest>, JsonRejection>,
) -> Result<StartResponse, ApiError>
where
    E: RelayEffector + 'static,
{
    let Json(req) = body?;
    state.relay_service.start_loop(
        &req.device,
        req.on_seconds,
        req.off_seconds,
        req.total_seconds,
    )?;
    Ok(StartResponse::Started)
}

/// `POST /api/devices/{id}/cancel`
pub async fn cancel<E>(
    State(state): State<AppState<E>>,
    Path(id): Path<String>,
) -> Result<CancelResponse, ApiError>
where
    E: RelayEffector + 'static,
{
    state.relay_service.cancel(&id)?;
    Ok(CancelResponse::Accepted)
}
