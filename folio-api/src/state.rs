use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use folio_db::repository::ContentRepository;
use secrecy::ExposeSecret;
use tracing::warn;

use super::{
    config::Config,
    error::AppError,
    session::{SessionStore, signing_key},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub repository: Arc<ContentRepository>,
    pub sessions: Arc<SessionStore>,
    key: Key,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let repository = ContentRepository::new(config.content_file.clone());
        let sessions = SessionStore::new(config.session_ttl);
        let key = signing_key(config.session_secret.expose_secret());

        Self {
            config: Arc::new(config),
            repository: Arc::new(repository),
            sessions: Arc::new(sessions),
            key,
        }
    }

    /// Checks a login attempt. The username must match exactly and the
    /// password must verify against the configured bcrypt hash.
    pub async fn verify_credentials(&self, username: &str, password: String) -> Result<bool, AppError> {
        if username != self.config.admin_user {
            return Ok(false);
        }

        let hash = self.config.admin_pass_hash.clone();
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AppError::InternalError(Box::new(e)))?;

        Ok(verified.unwrap_or_else(|e| {
            warn!("Configured admin password hash is unusable: {e}");
            false
        }))
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}
