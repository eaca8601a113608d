use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::{error, warn};

use atrium_types::api::{
    ConfirmAppointmentRequest, CreateAppointmentRequest, CreateAppointmentResponse,
};
use atrium_types::models::Appointment;

use crate::AppState;
use crate::error::ApiError;
use crate::guard::AdminSession;

/// Public: book a new appointment. Field presence is enforced by
/// deserialization; the contents are stored as submitted.
pub async fn create_appointment(
    State(state): State<AppState>,
    Json(req): Json<CreateAppointmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let id = tokio::task::spawn_blocking(move || store.create(req.into()))
        .await
        .map_err(join_error)?
        .map_err(|e| {
            error!("Error creating appointment: {e:#}");
            ApiError::Internal("Failed to book appointment")
        })?;

    Ok((
        StatusCode::CREATED,
        Json(CreateAppointmentResponse {
            message: "Appointment booked successfully!".into(),
            appointment_id: id,
        }),
    ))
}

/// Admin-only: all appointments, newest first.
pub async fn list_appointments(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    let store = state.store.clone();
    let records = tokio::task::spawn_blocking(move || store.list())
        .await
        .map_err(join_error)?
        .map_err(|e| {
            error!("Error fetching appointments: {e:#}");
            ApiError::Internal("Failed to fetch appointments")
        })?;

    Ok(Json(records))
}

/// Admin-only: confirm an appointment, then notify the client. The record
/// stays confirmed even when the notification fails; the response message is
/// the only place that failure shows up.
pub async fn confirm_appointment(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<String>,
    Json(req): Json<ConfirmAppointmentRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let store = state.store.clone();
    let date = req.appointment_date;
    let time = req.appointment_time.clone();
    let confirm_id = id.clone();
    let updated = tokio::task::spawn_blocking(move || store.confirm(&confirm_id, date, &time))
        .await
        .map_err(join_error)?
        .map_err(|e| {
            error!("Error confirming appointment {id}: {e:#}");
            ApiError::Internal("Failed to confirm appointment")
        })?;

    let Some(appointment) = updated else {
        return Err(ApiError::NotFound("Appointment not found"));
    };

    let message = match state
        .mailer
        .send_confirmation(&appointment, req.appointment_date, &req.appointment_time)
        .await
    {
        Ok(()) => "Appointment confirmed and email sent!",
        Err(e) => {
            warn!("Email sending failed for appointment {}: {e:#}", appointment.id);
            "Appointment confirmed, but email failed to send."
        }
    };

    Ok(Json(serde_json::json!({ "message": message })))
}

/// Admin-only: remove an appointment outright.
pub async fn delete_appointment(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let store = state.store.clone();
    let delete_id = id.clone();
    let deleted = tokio::task::spawn_blocking(move || store.delete(&delete_id))
        .await
        .map_err(join_error)?
        .map_err(|e| {
            error!("Error deleting appointment {id}: {e:#}");
            ApiError::Internal("Failed to delete appointment")
        })?;

    if !deleted {
        return Err(ApiError::NotFound("Appointment not found"));
    }

    Ok(Json(serde_json::json!({ "message": "Appointment deleted successfully" })))
}

fn join_error(e: tokio::task::JoinError) -> ApiError {
    error!("spawn_blocking join error: {e}");
    ApiError::Internal("Internal server error")
}
