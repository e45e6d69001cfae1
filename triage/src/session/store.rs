//! The session store trait and its provided operations.

use async_trait::async_trait;
use triage_agent::{Message, Role};

use super::model::Session;

/// Error types for session storage.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record for the id
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Id is empty or would escape the storage directory
    #[error("Invalid session id: {0:?}")]
    InvalidSessionId(String),

    /// Backend I/O failure
    #[error("Session I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Record could not be encoded or decoded
    #[error("Session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Check that a session id is non-empty and made only of ASCII
/// alphanumerics, `-` and `_`.
pub fn validate_session_id(id: &str) -> Result<(), StoreError> {
    let well_formed = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if well_formed {
        Ok(())
    } else {
        Err(StoreError::InvalidSessionId(id.to_string()))
    }
}

/// Keyed session storage.
///
/// Implementors provide whole-record `load` and `save`. Every provided write
/// reads the current record (or a fresh one), mutates it, refreshes
/// `last_updated`, bumps `revision` and saves the whole record back. Two
/// concurrent writers to one id can therefore lose an update; callers
/// serialize steps per session (see [`crate::gate::SessionGate`]).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read a record, `None` if absent.
    async fn load(&self, id: &str) -> Result<Option<Session>, StoreError>;

    /// Replace the record for `session.id`.
    async fn save(&self, session: &Session) -> Result<(), StoreError>;

    /// The stored record, or a fresh empty one. A fresh record is not
    /// persisted until the first write.
    async fn get_or_create(&self, id: &str) -> Result<Session, StoreError> {
        Ok(self
            .load(id)
            .await?
            .unwrap_or_else(|| Session::new(id)))
    }

    /// The stored record, or `NotFound`.
    async fn read(&self, id: &str) -> Result<Session, StoreError> {
        self.load(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Append one message to the transcript.
    async fn append_message(
        &self,
        id: &str,
        role: Role,
        content: &str,
    ) -> Result<Session, StoreError> {
        let mut session = self.get_or_create(id).await?;
        session.history.push(Message {
            role,
            content: content.to_string(),
        });
        session.touch();
        self.save(&session).await?;
        Ok(session)
    }

    /// Replace the current path.
    async fn set_path(&self, id: &str, path: &[String]) -> Result<Session, StoreError> {
        let mut session = self.get_or_create(id).await?;
        session.path = path.to_vec();
        session.touch();
        self.save(&session).await?;
        Ok(session)
    }

    /// Set or clear the final flag.
    async fn set_final(&self, id: &str, is_final: bool) -> Result<Session, StoreError> {
        let mut session = self.get_or_create(id).await?;
        session.is_final = is_final;
        session.touch();
        self.save(&session).await?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_session_id() {
        assert!(validate_session_id("3f2b9c1e-8d4a-4b7e-9f00-1a2b3c4d5e6f").is_ok());
        assert!(validate_session_id("student_42").is_ok());

        for bad in ["", "../etc/passwd", "a/b", "a b", "dot.json", "ünïcode"] {
            assert!(
                matches!(validate_session_id(bad), Err(StoreError::InvalidSessionId(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
