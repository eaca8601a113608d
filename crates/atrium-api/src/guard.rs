use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;

use crate::error::ApiError;
use crate::session::{self, SESSION_COOKIE, Session};
use crate::{AppState, AppStateInner};

/// Proof that a request carries a valid admin session. Handlers for
/// admin-only operations take this as an argument; rejection is
/// content-negotiated before any handler code runs.
pub struct AdminSession {
    pub user: String,
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        match current_session(state, &jar) {
            Some(session) => Ok(AdminSession { user: session.user }),
            // Browser navigations get sent to the login page; API calls get
            // a structured 401.
            None if wants_html(parts) => Err(Redirect::to("/login").into_response()),
            None => Err(ApiError::Unauthorized.into_response()),
        }
    }
}

/// Resolve the session a request's cookie points at: present, untampered,
/// and unexpired, or nothing.
pub fn current_session(state: &AppStateInner, jar: &CookieJar) -> Option<Session> {
    let raw = jar.get(SESSION_COOKIE)?.value();
    let sid = session::verify_cookie_value(&state.session_secret, raw)?;
    state.sessions.get(&sid)
}

fn wants_html(parts: &Parts) -> bool {
    parts
        .headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}
