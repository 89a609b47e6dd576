//! The alarm API consumed by the browser front end and the clock device.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use super::error::{ApiError, Envelope};
use super::payload::Payload;
use crate::models::{DeleteAlarmRequest, NumberOrText, SetAlarmRequest};
use crate::{AlarmRecord, AlarmService, Upserted};

// ---

pub fn router() -> Router<AlarmService> {
    // ---
    Router::new()
        .route("/api/alarms", get(list_alarms))
        .route("/api/next-alarm", get(next_alarm))
        .route("/api/set-alarm", post(set_alarm))
        .route("/api/delete-alarm", post(delete_alarm))
        .route("/api/alarm-stopped/{id}", post(alarm_stopped))
}

#[derive(Debug, Serialize)]
struct SetAlarmResponse {
    success: bool,
    message: &'static str,
    alarm: AlarmRecord,
}

fn ok(message: &str) -> Json<Envelope> {
    Json(Envelope {
        success: true,
        message: message.to_string(),
    })
}

/// `GET /api/alarms`: active alarms, earliest first.
async fn list_alarms(
    State(service): State<AlarmService>,
) -> Result<Json<Vec<AlarmRecord>>, ApiError> {
    // ---
    info!("GET /api/alarms");
    let alarms = service
        .list_active()
        .await
        .map_err(ApiError::context("Failed to fetch alarms."))?;
    Ok(Json(alarms))
}

/// `GET /api/next-alarm`: the alarm the device should arm next, or `{}`.
async fn next_alarm(State(service): State<AlarmService>) -> Result<Response, ApiError> {
    // ---
    let now = Local::now().fixed_offset();
    info!(now = %now.format("%H:%M"), "GET /api/next-alarm");

    let next = service
        .next_upcoming(now)
        .await
        .map_err(ApiError::context("Failed to fetch next alarm."))?;

    Ok(match next {
        Some(alarm) => Json(alarm).into_response(),
        None => Json(json!({})).into_response(),
    })
}

/// `POST /api/set-alarm`: create (`201`) or update by id (`200`).
async fn set_alarm(
    State(service): State<AlarmService>,
    Payload(request): Payload<SetAlarmRequest>,
) -> Result<(StatusCode, Json<SetAlarmResponse>), ApiError> {
    // ---
    info!(id = ?request.id, alarm_time = ?request.alarm_time, "POST /api/set-alarm");

    let (id, draft) = request
        .validate()
        .map_err(ApiError::context("Failed to set alarm."))?;

    let upserted = service
        .upsert(id, draft)
        .await
        .map_err(ApiError::context("Failed to set alarm."))?;

    let (status, message, alarm) = match upserted {
        Upserted::Created(alarm) => (StatusCode::CREATED, "Alarm added successfully!", alarm),
        Upserted::Updated(alarm) => (StatusCode::OK, "Alarm updated successfully!", alarm),
    };

    Ok((
        status,
        Json(SetAlarmResponse {
            success: true,
            message,
            alarm,
        }),
    ))
}

/// `POST /api/delete-alarm`: soft delete from the front end.
async fn delete_alarm(
    State(service): State<AlarmService>,
    Payload(request): Payload<DeleteAlarmRequest>,
) -> Result<Json<Envelope>, ApiError> {
    // ---
    info!(id = ?request.id, "POST /api/delete-alarm");

    let id = request
        .id
        .as_ref()
        .filter(|id| !id.is_blank())
        .ok_or_else(|| ApiError::bad_request("Alarm ID is required for deletion."))?
        .to_id()
        .map_err(ApiError::context("Failed to delete alarm."))?;

    service
        .deactivate(id)
        .await
        .map_err(ApiError::context("Failed to delete alarm."))?;

    Ok(ok("Alarm deleted successfully."))
}

/// `POST /api/alarm-stopped/{id}`: the device reports it silenced an alarm.
async fn alarm_stopped(
    State(service): State<AlarmService>,
    Path(raw_id): Path<String>,
) -> Result<Json<Envelope>, ApiError> {
    // ---
    info!(id = %raw_id, "POST /api/alarm-stopped");

    let id = NumberOrText::Text(raw_id)
        .to_id()
        .map_err(ApiError::context("Failed to stop alarm."))?;

    service
        .acknowledge_stopped(id)
        .await
        .map_err(ApiError::context("Failed to stop alarm."))?;

    Ok(ok("Alarm stopped (deactivated)."))
}
