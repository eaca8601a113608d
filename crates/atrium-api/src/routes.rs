use axum::routing::{delete, get, post, put};
use axum::{Json, Router, extract::State};
use tracing::warn;

use crate::error::ApiError;
use crate::guard::AdminSession;
use crate::{AppState, appointments, auth};

/// The JSON API surface. The server binary layers pages, static assets,
/// CORS, and tracing on top.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/appointments",
            post(appointments::create_appointment).get(appointments::list_appointments),
        )
        .route(
            "/api/appointments/{id}/confirm",
            put(appointments::confirm_appointment),
        )
        .route(
            "/api/appointments/{id}",
            delete(appointments::delete_appointment),
        )
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/test-email", post(test_email))
        .route("/health", get(health))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "store": state.backend }))
}

/// Admin-only end-to-end check of the mail transport.
async fn test_email(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.mailer.send_probe().await.map_err(|e| {
        warn!("Test email failed: {e:#}");
        ApiError::BadGateway("Test email failed to send")
    })?;

    Ok(Json(serde_json::json!({ "ok": true })))
}
