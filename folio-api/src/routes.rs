use axum::{
    Json,
    body::Bytes,
    extract::{
        Path, State,
        rejection::{BytesRejection, JsonRejection},
    },
    http::{
        HeaderMap,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::IntoResponse,
};
use axum_extra::extract::SignedCookieJar;
use folio_common::{Document, validate_candidate};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    session::{AdminSession, GateState, removal_cookie, session_cookie, session_id},
    state::AppState,
};

pub const EXPORT_FILE_NAME: &str = "portfolio-backup.json";

#[derive(Deserialize, Default)]
pub struct LoginRequest {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

fn ok() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn load(state: &AppState) -> Result<Document, AppError> {
    state.repository.read().await.map_err(AppError::LoadFailed)
}

pub async fn public_content_handler(State(state): State<AppState>) -> Result<Json<Document>, AppError> {
    Ok(Json(load(&state).await?))
}

fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// A login body that is absent or not JSON reads as an empty form, so the
/// caller is told which fields are required.
fn login_request(headers: &HeaderMap, body: &[u8]) -> Result<LoginRequest, AppError> {
    if !is_json(headers) || body.trim_ascii().is_empty() {
        return Ok(LoginRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        debug!("Rejected login body: {e}");
        AppError::MalformedPayload
    })
}

pub async fn login_handler(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<(SignedCookieJar, Json<Value>), AppError> {
    let request = login_request(&headers, &body?)?;

    let (username, password) = match (request.username, request.password) {
        (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
            (username, password)
        }
        _ => return Err(AppError::MissingCredentials),
    };

    if !state.verify_credentials(&username, password).await? {
        warn!("Rejected login attempt for {username:?}");
        return Err(AppError::InvalidCredentials);
    }

    // Never carry a pre-login session id across authentication.
    if let Some(previous) = session_id(&jar) {
        state.sessions.destroy(&previous);
    }

    let id = state.sessions.issue();
    info!("Administrator signed in");

    let jar = jar.add(session_cookie(id, state.sessions.ttl()));
    Ok((jar, ok()))
}

pub async fn logout_handler(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> (SignedCookieJar, Json<Value>) {
    if let Some(id) = session_id(&jar) {
        if state.sessions.destroy(&id) {
            info!("Administrator signed out");
        }
    }

    (jar.remove(removal_cookie()), ok())
}

pub async fn me_handler(State(state): State<AppState>, jar: SignedCookieJar) -> Json<Value> {
    let authenticated = state.gate_state(&jar) == GateState::Authenticated;
    Json(json!({ "authenticated": authenticated }))
}

pub async fn admin_content_handler(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Result<Json<Document>, AppError> {
    Ok(Json(load(&state).await?))
}

pub async fn admin_section_handler(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(section): Path<String>,
) -> Result<Json<Value>, AppError> {
    let mut document = load(&state).await?;
    document
        .section_mut(&section)
        .map(|value| Json(value.take()))
        .ok_or(AppError::SectionNotFound)
}

/// Replaces the stored document wholesale. There is no merge with what is on
/// disk: the body must be a complete document.
pub async fn replace_content_handler(
    State(state): State<AppState>,
    _session: AdminSession,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(candidate) = payload?;

    let document = validate_candidate(candidate).inspect_err(|e| {
        warn!("Rejected content update: {e}");
    })?;

    state
        .repository
        .write(&document)
        .await
        .map_err(AppError::SaveFailed)?;

    info!(sections = document.len(), "Content replaced");
    Ok(ok())
}

pub async fn export_handler(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Result<impl IntoResponse, AppError> {
    let document = load(&state).await?;
    let body = serde_json::to_string_pretty(&document)
        .map_err(|e| AppError::InternalError(Box::new(e)))?;

    Ok((
        [
            (CONTENT_TYPE, "application/json".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename={EXPORT_FILE_NAME}"),
            ),
        ],
        body,
    ))
}
