//! Access control gate.
//!
//! A session is a server-side record keyed by a random id. The id travels in
//! a signed cookie; a cookie whose signature does not verify is ignored. A
//! record only exists once a login succeeded, so the presence of a live
//! record is what makes a request `Authenticated`. Records expire a fixed TTL
//! after issuance, independent of activity.
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use parking_lot::Mutex;
use sha2::{Digest, Sha512};
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

pub const SESSION_COOKIE: &str = "folio.sid";
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Anonymous,
    Authenticated,
}

#[derive(Debug)]
struct SessionRecord {
    issued_at: Instant,
}

#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<Uuid, SessionRecord>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Records a freshly authenticated session and returns its id.
    pub fn issue(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.lock().insert(
            id,
            SessionRecord {
                issued_at: Instant::now(),
            },
        );
        id
    }

    pub fn state(&self, id: &Uuid) -> GateState {
        let mut sessions = self.sessions.lock();
        match sessions.get(id) {
            Some(record) if record.issued_at.elapsed() < self.ttl => GateState::Authenticated,
            Some(_) => {
                sessions.remove(id);
                GateState::Anonymous
            }
            None => GateState::Anonymous,
        }
    }

    pub fn destroy(&self, id: &Uuid) -> bool {
        self.sessions.lock().remove(id).is_some()
    }

    pub fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, record| record.issued_at.elapsed() < self.ttl);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stretches an arbitrary-length secret into the 64 bytes the cookie signer
/// needs.
pub fn signing_key(secret: &str) -> Key {
    Key::from(Sha512::digest(secret.as_bytes()).as_slice())
}

pub fn session_id(jar: &SignedCookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| cookie.value().parse().ok())
}

pub fn session_cookie(id: Uuid, ttl: Duration) -> Cookie<'static> {
    let max_age = time::Duration::seconds(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX));

    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

impl AppState {
    pub fn gate_state(&self, jar: &SignedCookieJar) -> GateState {
        session_id(jar)
            .map(|id| self.sessions.state(&id))
            .unwrap_or(GateState::Anonymous)
    }
}

/// Extractor for admin-only handlers. Rejects with `Unauthorized` before the
/// handler (or its body extractor) runs.
#[derive(Debug, Clone, Copy)]
pub struct AdminSession {
    pub id: Uuid,
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = match SignedCookieJar::<Key>::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(never) => match never {},
        };

        match session_id(&jar) {
            Some(id) if state.sessions.state(&id) == GateState::Authenticated => Ok(Self { id }),
            _ => Err(AppError::Unauthorized),
        }
    }
}
