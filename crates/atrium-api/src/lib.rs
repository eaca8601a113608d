pub mod appointments;
pub mod auth;
pub mod error;
pub mod guard;
pub mod routes;
pub mod session;

use std::sync::Arc;

use atrium_mailer::Mailer;
use atrium_store::SharedStore;

use crate::session::SessionStore;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: SharedStore,
    /// Which backend the startup probe selected; reported by /health.
    pub backend: &'static str,
    pub sessions: SessionStore,
    pub mailer: Mailer,
    pub admin_user: String,
    pub admin_pass: String,
    pub session_secret: String,
}
