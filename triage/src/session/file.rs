//! JSON-file session store.
//!
//! One pretty-printed document per session at `<dir>/<id>.json`. Writes go
//! to a temporary file in the same directory and are renamed into place, so
//! a reader sees either the previous record or the new one.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::model::Session;
use super::store::{validate_session_id, SessionStore, StoreError};

/// Session store writing one JSON document per session.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Store records under `dir`, created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for `id`.
    pub fn record_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        validate_session_id(id)?;
        Ok(self.dir.join(format!("{}.json", id)))
    }

    fn io_error(path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let path = self.record_path(id)?;

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_error(&path, e)),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        let path = self.record_path(&session.id)?;

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Self::io_error(&self.dir, e))?;

        let json = serde_json::to_string_pretty(session)?;

        let tmp_path = self
            .dir
            .join(format!(".{}.json.{}.tmp", session.id, uuid::Uuid::new_v4().simple()));
        let mut tmp_file = fs::File::create(&tmp_path)
            .await
            .map_err(|e| Self::io_error(&tmp_path, e))?;
        tmp_file
            .write_all(json.as_bytes())
            .await
            .map_err(|e| Self::io_error(&tmp_path, e))?;
        tmp_file
            .sync_all()
            .await
            .map_err(|e| Self::io_error(&tmp_path, e))?;
        drop(tmp_file);

        if let Err(e) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(Self::io_error(&path, e));
        }

        debug!(session_id = %session.id, revision = session.revision, "Saved session");
        Ok(())
    }
}
