//! Outcome and error types for the traversal engine.

use serde::{Deserialize, Serialize};
use triage_agent::GatewayError;

use crate::session::StoreError;

/// Result of one classification step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum ClassificationOutcome {
    /// Matched at least one level but stopped above a leaf
    Descended(Vec<String>),
    /// Reached a leaf during this step
    FinalReached(Vec<String>),
    /// The session was final before this step
    AlreadyFinal(Vec<String>),
    /// No match; the question was appended to the transcript
    ClarificationNeeded(String),
}

impl ClassificationOutcome {
    /// Whether the session is final after this step.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::FinalReached(_) | Self::AlreadyFinal(_))
    }

    /// The path after this step, when the outcome carries one.
    pub fn path(&self) -> Option<&[String]> {
        match self {
            Self::Descended(path) | Self::FinalReached(path) | Self::AlreadyFinal(path) => {
                Some(path)
            }
            Self::ClarificationNeeded(_) => None,
        }
    }
}

/// Error types for triage operations.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    /// Accessor called for an id with no record
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Session storage failure
    #[error("Session store error: {0}")]
    Store(StoreError),

    /// Classifier transport failure
    #[error("Classifier error: {0}")]
    Gateway(#[from] GatewayError),
}

impl From<StoreError> for TriageError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => TriageError::SessionNotFound(id),
            other => TriageError::Store(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, TriageError>;
