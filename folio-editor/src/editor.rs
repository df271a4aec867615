use tracing::{info, warn};

use crate::{
    client::{ApiError, ContentApi},
    state::EditorState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// Outcome of one section save, shown to the operator as a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub section: String,
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    fn success(section: &str) -> Self {
        Self {
            section: section.to_string(),
            kind: NotificationKind::Success,
            message: format!("{section} saved successfully"),
        }
    }

    fn error(section: &str, error: &ApiError) -> Self {
        let message = match error {
            ApiError::Network(_) => "Network error".to_string(),
            other => other.to_string(),
        };
        Self {
            section: section.to_string(),
            kind: NotificationKind::Error,
            message,
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == NotificationKind::Success
    }
}

/// Admin editing session: the mirror plus the API it is saved through.
///
/// Saves are per section from the operator's point of view, but the server
/// only accepts whole documents, so every save sends the full mirror. Only
/// the saved section's dirty flag is cleared.
pub struct Editor<A> {
    api: A,
    state: EditorState,
}

impl<A: ContentApi> Editor<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: EditorState::default(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut EditorState {
        &mut self.state
    }

    pub async fn is_authenticated(&self) -> Result<bool, ApiError> {
        self.api.status().await
    }

    /// Signs in and loads the current document.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), ApiError> {
        self.api.login(username, password).await?;
        self.load().await
    }

    pub async fn logout(&mut self) -> Result<(), ApiError> {
        self.api.logout().await
    }

    /// Replaces the mirror with the stored document, discarding local edits.
    pub async fn load(&mut self) -> Result<(), ApiError> {
        let document = self.api.fetch().await?;
        info!(sections = document.len(), "Loaded content");
        self.state.replace_mirror(document);
        Ok(())
    }

    pub async fn save_section(&mut self, section: &str) -> Notification {
        match self.api.replace(self.state.mirror()).await {
            Ok(()) => {
                self.state.mark_clean(section);
                info!(section, "Section saved");
                Notification::success(section)
            }
            Err(e) => {
                warn!(section, "Save failed: {e}");
                Notification::error(section, &e)
            }
        }
    }

    /// Saves every dirty section in turn, one round trip at a time. A failure
    /// does not stop the batch and nothing is rolled back, so the result can
    /// mix successes and errors.
    pub async fn save_all_dirty(&mut self) -> Vec<Notification> {
        let sections = self.state.dirty_sections().to_vec();
        let mut notifications = Vec::with_capacity(sections.len());
        for section in sections {
            notifications.push(self.save_section(&section).await);
        }
        notifications
    }
}
