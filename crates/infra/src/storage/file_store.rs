//! File-backed session persistence
//!
//! The browser-storage analog: one JSON file holding the authenticated
//! snapshot. `clear_all` removes the file outright rather than editing
//! keys, so nothing from one account survives into the next session.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use opencircle_core::SessionStorage;
use opencircle_domain::{AuthorizedSession, OpenCircleError, Result};
use tracing::{debug, warn};

/// JSON-file implementation of the session storage port
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionStorage for FileSessionStorage {
    async fn persist(&self, snapshot: &AuthorizedSession) -> Result<()> {
        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|err| OpenCircleError::Storage(format!("serialize snapshot: {err}")))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|err| {
                    OpenCircleError::Storage(format!("create storage directory: {err}"))
                })?;
            }
        }

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|err| OpenCircleError::Storage(format!("write snapshot: {err}")))?;

        debug!(path = %self.path.display(), "session snapshot persisted");
        Ok(())
    }

    async fn load(&self) -> Result<Option<AuthorizedSession>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(OpenCircleError::Storage(format!("read snapshot: {err}")));
            }
        };

        // A corrupt snapshot is treated as logged out rather than a hard
        // failure; the next login overwrites it.
        match serde_json::from_str(&contents) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "discarding corrupt session snapshot");
                Ok(None)
            }
        }
    }

    async fn clear_all(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "persisted client storage cleared");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(OpenCircleError::Storage(format!("clear storage: {err}"))),
        }
    }
}
