use std::path::PathBuf;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum_extra::extract::CookieJar;
use tower_http::services::ServeDir;
use tracing::error;

use atrium_api::{AppState, guard};

#[derive(Clone)]
struct PageState {
    app: AppState,
    static_dir: PathBuf,
}

/// Page routes: the landing page is public, the login page bounces an
/// already-authenticated admin to the dashboard, the dashboard itself is
/// redirect-gated. Everything else under the static dir (scripts, styles)
/// is served as-is.
pub fn router(app: AppState, static_dir: PathBuf) -> Router {
    let state = PageState {
        app,
        static_dir: static_dir.clone(),
    };

    Router::new()
        .route("/", get(index))
        .route("/login", get(login_page))
        .route("/admin", get(admin_page))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}

async fn index(State(state): State<PageState>) -> Response {
    serve_page(&state, "index.html").await
}

async fn login_page(State(state): State<PageState>, jar: CookieJar) -> Response {
    if guard::current_session(&state.app, &jar).is_some() {
        return Redirect::to("/admin").into_response();
    }
    serve_page(&state, "login.html").await
}

async fn admin_page(State(state): State<PageState>, jar: CookieJar) -> Response {
    if guard::current_session(&state.app, &jar).is_none() {
        return Redirect::to("/login").into_response();
    }
    serve_page(&state, "admin.html").await
}

async fn serve_page(state: &PageState, file: &str) -> Response {
    let path = state.static_dir.join(file);
    match tokio::fs::read_to_string(&path).await {
        Ok(contents) => Html(contents).into_response(),
        Err(e) => {
            error!("Failed to read page {}: {}", path.display(), e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Page not available").into_response()
        }
    }
}
