use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

pub const SESSION_COOKIE: &str = "atrium.sid";
pub const SESSION_TTL_HOURS: i64 = 8;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone)]
pub struct Session {
    pub user: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// In-process session store keyed by opaque session id. There is exactly one
/// admin identity, so the store only ever holds that identity's sessions.
#[derive(Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for `user` and return its id.
    pub fn insert(&self, user: &str) -> String {
        self.insert_until(user, Utc::now() + Duration::hours(SESSION_TTL_HOURS))
    }

    fn insert_until(&self, user: &str, expires_at: DateTime<Utc>) -> String {
        let sid = generate_sid();
        let session = Session {
            user: user.to_string(),
            created_at: Utc::now(),
            expires_at,
        };
        self.lock().insert(sid.clone(), session);
        sid
    }

    /// Look up a session, evicting it if it has expired.
    pub fn get(&self, sid: &str) -> Option<Session> {
        let mut sessions = self.lock();
        match sessions.get(sid) {
            Some(s) if s.is_expired() => {
                sessions.remove(sid);
                None
            }
            Some(s) => Some(s.clone()),
            None => None,
        }
    }

    pub fn remove(&self, sid: &str) {
        self.lock().remove(sid);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Cookie value is `<sid>.<hex hmac>`. A tampered or forged id fails the
/// signature check before the store is ever consulted.
pub fn cookie_value(secret: &str, sid: &str) -> String {
    format!("{}.{}", sid, sign(secret, sid))
}

pub fn verify_cookie_value(secret: &str, value: &str) -> Option<String> {
    let (sid, sig) = value.rsplit_once('.')?;
    let sig_bytes = hex::decode(sig).ok()?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(sid.as_bytes());
    mac.verify_slice(&sig_bytes).ok()?;
    Some(sid.to_string())
}

fn sign(secret: &str, sid: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any size");
    mac.update(sid.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn generate_sid() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
