use folio_common::Document;
use log::{debug, info};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::fs;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not valid JSON: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} does not hold a JSON object", path.display())]
    NotAnObject { path: PathBuf },

    #[error("failed to encode content: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The single JSON file holding the Content Document.
///
/// There is no lock around the file. Two concurrent writers each replace the
/// whole document and whichever rename lands last wins.
#[derive(Debug, Clone)]
pub struct ContentRepository {
    path: PathBuf,
}

impl ContentRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        fs::try_exists(&self.path).await.unwrap_or(false)
    }

    pub async fn read(&self) -> Result<Document, StoreError> {
        let raw = fs::read_to_string(&self.path)
            .await
            .map_err(|source| StoreError::Read {
                path: self.path.clone(),
                source,
            })?;

        let value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })?;

        Document::from_value(value).map_err(|_| StoreError::NotAnObject {
            path: self.path.clone(),
        })
    }

    /// Replaces the document wholesale. The new content goes to a sibling
    /// temporary file first and is renamed over the target.
    pub async fn write(&self, document: &Document) -> Result<(), StoreError> {
        let mut encoded = serde_json::to_string_pretty(document)?;
        encoded.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| self.write_error(source))?;
        }

        let temp_path = self.temp_path();
        debug!("Writing {} bytes to {temp_path:?}", encoded.len());

        if let Err(source) = fs::write(&temp_path, encoded).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(self.write_error(source));
        }

        if let Err(source) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(self.write_error(source));
        }

        info!(
            "Content document replaced at {:?} ({} sections)",
            self.path,
            document.len()
        );
        Ok(())
    }

    fn write_error(&self, source: io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name: OsString = self.path.as_os_str().to_owned();
        name.push(format!(
            ".{}.{}.tmp",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        PathBuf::from(name)
    }
}
