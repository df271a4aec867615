use axum::{
    Json,
    extract::rejection::{BytesRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use folio_common::ContentError;
use folio_db::repository::StoreError;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Invalid content format")]
    InvalidContent(#[from] ContentError),

    #[error("Username and password are required")]
    MissingCredentials,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Section not found")]
    SectionNotFound,

    #[error("Failed to load content")]
    LoadFailed(#[source] StoreError),

    #[error("Failed to save content")]
    SaveFailed(#[source] StoreError),

    #[error("Internal server error")]
    InternalError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected request body: {}", rejection.body_text());
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::MalformedPayload
        }
    }
}

impl From<BytesRejection> for AppError {
    fn from(rejection: BytesRejection) -> Self {
        debug!("Rejected request body: {}", rejection.body_text());
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::MalformedPayload
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MalformedPayload
            | AppError::InvalidContent { .. }
            | AppError::MissingCredentials => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::InvalidCredentials | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::SectionNotFound => StatusCode::NOT_FOUND,
            AppError::LoadFailed(ref e) | AppError::SaveFailed(ref e) => {
                error!("{self}: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::InternalError(ref e) => {
                error!("Internal error: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
