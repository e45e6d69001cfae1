//! Per-session serialization of classification steps.
//!
//! Within one process, steps on a session queue on an async mutex. When the
//! gate has a lock directory, the holder also takes an exclusive advisory
//! lock on `<dir>/<id>.lock`, so separate processes sharing a session
//! directory serialize as well.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use fs2::FileExt;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::session::{validate_session_id, StoreError};

type LockMap = DashMap<String, Arc<Mutex<()>>>;

/// One async mutex per session id, optionally backed by a lock file.
///
/// Steps on the same session run one at a time; different sessions proceed
/// in parallel. An entry lives only while a guard holds it or a caller waits
/// on it.
#[derive(Debug, Default)]
pub struct SessionGate {
    locks: Arc<LockMap>,
    lock_dir: Option<PathBuf>,
}

impl SessionGate {
    /// In-process gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate that also locks `<dir>/<id>.lock` for the holder.
    pub fn with_lock_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            locks: Arc::default(),
            lock_dir: Some(dir.into()),
        }
    }

    pub fn lock_dir(&self) -> Option<&Path> {
        self.lock_dir.as_deref()
    }

    /// Wait for exclusive access to `session_id`.
    pub async fn lock(&self, session_id: &str) -> Result<SessionGuard, StoreError> {
        validate_session_id(session_id)?;

        let lock = self
            .locks
            .entry(session_id.to_string())
            .or_default()
            .clone();

        let mut guard = SessionGuard {
            session_id: session_id.to_string(),
            locks: self.locks.clone(),
            local: Some(lock.lock_owned().await),
            file: None,
        };

        if let Some(dir) = &self.lock_dir {
            let path = dir.join(format!("{}.lock", session_id));
            let dir = dir.clone();
            let file = tokio::task::spawn_blocking(move || lock_file(&dir, &path))
                .await
                .map_err(|e| StoreError::Io {
                    path: session_id.to_string(),
                    source: std::io::Error::other(e),
                })??;
            guard.file = Some(file);
        }

        debug!(session_id = %session_id, "Session locked");
        Ok(guard)
    }

    /// Number of sessions currently held or awaited.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Blocks until the advisory lock on `path` is ours. The file is never
/// removed; the lock is released when the handle closes.
fn lock_file(dir: &Path, path: &Path) -> Result<File, StoreError> {
    let io_error = |path: &Path, source| StoreError::Io {
        path: path.display().to_string(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| io_error(path, e))?;

    file.lock_exclusive().map_err(|e| io_error(path, e))?;
    Ok(file)
}

/// Exclusive hold on one session; released on drop.
#[derive(Debug)]
pub struct SessionGuard {
    session_id: String,
    locks: Arc<LockMap>,
    local: Option<OwnedMutexGuard<()>>,
    file: Option<File>,
}

impl SessionGuard {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = FileExt::unlock(&file);
        }
        drop(self.local.take());

        // Only the map's own reference left means nobody holds or awaits it
        self.locks
            .remove_if(&self.session_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_same_session_is_exclusive() {
        let gate = Arc::new(SessionGate::new());

        let guard = gate.lock("s1").await.unwrap();

        let contender = {
            let gate = gate.clone();
            tokio::spawn(async move {
                let _guard = gate.lock("s1").await.unwrap();
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_sessions_do_not_block() {
        let gate = SessionGate::new();

        let a = gate.lock("a").await.unwrap();
        let b = tokio::time::timeout(Duration::from_secs(1), gate.lock("b"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(gate.len(), 2);
        assert_eq!(b.session_id(), "b");

        drop(a);
        drop(b);
        assert!(gate.is_empty());
    }

    #[tokio::test]
    async fn test_entries_released_after_use() {
        let gate = SessionGate::new();

        for i in 0..20 {
            let _guard = gate.lock(&format!("s{}", i)).await.unwrap();
        }

        assert!(gate.is_empty());
    }

    #[tokio::test]
    async fn test_entry_kept_while_awaited() {
        let gate = Arc::new(SessionGate::new());
        let guard = gate.lock("s1").await.unwrap();

        let contender = {
            let gate = gate.clone();
            tokio::spawn(async move {
                let _guard = gate.lock("s1").await.unwrap();
                tokio::time::sleep(Duration::from_millis(20)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        drop(guard);
        assert_eq!(gate.len(), 1);

        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
        assert!(gate.is_empty());
    }

    #[tokio::test]
    async fn test_separate_gates_share_lock_file() {
        let dir = TempDir::new().unwrap();
        let first = SessionGate::with_lock_dir(dir.path().join("chat_history"));
        let second = SessionGate::with_lock_dir(dir.path().join("chat_history"));

        let guard = first.lock("s1").await.unwrap();
        assert!(dir.path().join("chat_history/s1.lock").exists());

        let contender = tokio::spawn(async move {
            let _guard = second.lock("s1").await.unwrap();
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(2), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_rejects_escaping_ids() {
        let dir = TempDir::new().unwrap();
        let gate = SessionGate::with_lock_dir(dir.path());

        let err = gate.lock("../outside").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidSessionId(_)));
        assert!(gate.is_empty());
    }
}
