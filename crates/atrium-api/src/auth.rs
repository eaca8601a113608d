use axum::Json;
use axum::extract::State;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::info;

use atrium_types::api::{AuthStatusResponse, LoginRequest, LoginResponse};

use crate::error::ApiError;
use crate::guard;
use crate::session::{self, SESSION_COOKIE, SESSION_TTL_HOURS};
use crate::AppState;

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    // One fixed credential pair; the response never says which half was wrong.
    if req.username != state.admin_user || req.password != state.admin_pass {
        return Err(ApiError::InvalidCredentials);
    }

    let sid = state.sessions.insert(&state.admin_user);
    let cookie = Cookie::build((
        SESSION_COOKIE,
        session::cookie_value(&state.session_secret, &sid),
    ))
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax)
    .max_age(time::Duration::hours(SESSION_TTL_HOURS))
    .build();

    info!("Admin '{}' logged in", state.admin_user);
    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            message: "Logged in".into(),
            user: state.admin_user.clone(),
        }),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<serde_json::Value>) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Some(sid) = session::verify_cookie_value(&state.session_secret, cookie.value()) {
            state.sessions.remove(&sid);
        }
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    (jar, Json(serde_json::json!({ "message": "Logged out" })))
}

pub async fn me(State(state): State<AppState>, jar: CookieJar) -> Json<AuthStatusResponse> {
    match guard::current_session(&state, &jar) {
        Some(session) => Json(AuthStatusResponse {
            authenticated: true,
            user: Some(session.user),
        }),
        None => Json(AuthStatusResponse {
            authenticated: false,
            user: None,
        }),
    }
}
