use std::path::PathBuf;

use anyhow::Context;

use atrium_mailer::MailConfig;

/// Runtime settings. Everything comes from the environment with a hardcoded
/// dev fallback; the .env file (if any) is loaded before this runs.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub static_dir: PathBuf,
    pub session_secret: String,
    pub admin_user: String,
    pub admin_pass: String,
    /// Cross-site frontend origin allowed to send credentials. Unset means
    /// same-origin only.
    pub allowed_origin: Option<String>,
    pub mail: MailConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env_or("ATRIUM_PORT", "3000")
            .parse()
            .context("ATRIUM_PORT must be a port number")?;
        let from_address = env_or("ATRIUM_MAIL_FROM", "bookings@atrium.invalid");

        Ok(Self {
            host: env_or("ATRIUM_HOST", "0.0.0.0"),
            port,
            db_path: env_or("ATRIUM_DB_PATH", "atrium.db").into(),
            static_dir: env_or("ATRIUM_STATIC_DIR", "static").into(),
            session_secret: env_or("ATRIUM_SESSION_SECRET", "atrium-dev-secret"),
            admin_user: env_or("ATRIUM_ADMIN_USER", "admin"),
            admin_pass: env_or("ATRIUM_ADMIN_PASS", "admin123"),
            allowed_origin: std::env::var("ATRIUM_ALLOWED_ORIGIN").ok(),
            mail: MailConfig {
                api_url: env_or("ATRIUM_MAIL_API_URL", "https://mail.invalid"),
                api_token: env_or("ATRIUM_MAIL_API_TOKEN", ""),
                reply_to: std::env::var("ATRIUM_MAIL_REPLY_TO")
                    .unwrap_or_else(|_| from_address.clone()),
                from_address,
                from_name: env_or("ATRIUM_MAIL_FROM_NAME", "Atrium Consultancy"),
            },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
