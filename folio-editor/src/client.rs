use async_trait::async_trait;
use folio_common::{ContentError, Document};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server sent a malformed document: {0}")]
    Malformed(#[from] ContentError),
}

/// The admin surface of the content service, as the editor sees it.
#[async_trait]
pub trait ContentApi: Send + Sync {
    async fn status(&self) -> Result<bool, ApiError>;

    async fn login(&self, username: &str, password: &str) -> Result<(), ApiError>;

    async fn logout(&self) -> Result<(), ApiError>;

    async fn fetch(&self) -> Result<Document, ApiError>;

    /// Replaces the whole stored document.
    async fn replace(&self, document: &Document) -> Result<(), ApiError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct StatusBody {
    authenticated: bool,
}

pub struct HttpContentApi {
    client: Client,
    base_url: String,
}

impl HttpContentApi {
    /// `base_url` is the server root, e.g. `http://localhost:3000`. The client
    /// keeps the session cookie between calls.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Turns a non-success response into an error. The server's `error`
    /// message is used when the body carries one, `fallback` otherwise.
    async fn check(response: Response, fallback: &str) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        debug!("Request failed with {status}: {body}");
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|body| body.error)
            .unwrap_or_else(|_| fallback.to_string());

        Err(ApiError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ContentApi for HttpContentApi {
    async fn status(&self) -> Result<bool, ApiError> {
        let response = self.client.get(self.url("/api/admin/me")).send().await?;
        let body: StatusBody = Self::check(response, "Status check failed").await?.json().await?;
        Ok(body.authenticated)
    }

    async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("/api/admin/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;

        match Self::check(response, "Login failed").await {
            Err(ApiError::Unauthorized) => Err(ApiError::InvalidCredentials),
            other => other.map(|_| ()),
        }
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let response = self.client.post(self.url("/api/admin/logout")).send().await?;
        Self::check(response, "Logout failed").await?;
        Ok(())
    }

    async fn fetch(&self) -> Result<Document, ApiError> {
        let response = self.client.get(self.url("/api/admin/content")).send().await?;
        let value: serde_json::Value = Self::check(response, "Load failed").await?.json().await?;
        Ok(Document::from_value(value)?)
    }

    async fn replace(&self, document: &Document) -> Result<(), ApiError> {
        let response = self
            .client
            .put(self.url("/api/admin/content"))
            .json(document)
            .send()
            .await?;
        Self::check(response, "Save failed").await?;
        Ok(())
    }
}
