//! The traversal engine.
//!
//! One call to [`TraversalEngine::classify_step`] takes one user message and
//! descends the department tree as far as the classifier can match, one
//! classifier call per level. It stops at a leaf, or asks a clarifying
//! question at the first level without a match.

use std::sync::Arc;

use taxonomy::{render_resolution, Candidate, DepartmentTree, DEFAULT_MAX_DEPTH};
use tracing::{debug, error, info, warn};
use triage_agent::{ClassifierGateway, Message, Role};
use uuid::Uuid;

use crate::session::{Session, SessionStore};
use crate::state::TraversalState;
use crate::types::{ClassificationOutcome, Result};

/// Drives sessions down the department tree.
pub struct TraversalEngine {
    tree: Arc<DepartmentTree>,
    store: Arc<dyn SessionStore>,
    gateway: Arc<dyn ClassifierGateway>,
    max_depth: usize,
}

impl TraversalEngine {
    /// Create an engine with the default descent limit.
    pub fn new(
        tree: Arc<DepartmentTree>,
        store: Arc<dyn SessionStore>,
        gateway: Arc<dyn ClassifierGateway>,
    ) -> Self {
        Self {
            tree,
            store,
            gateway,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit the number of levels descended in one step.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Create and persist an empty session with a fresh id.
    pub async fn initiate_session(&self) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.store.save(&Session::new(&id)).await?;

        info!(session_id = %id, "Session initiated");
        Ok(id)
    }

    /// Process one user message for a session.
    ///
    /// The message is always appended to the transcript. Callers must not
    /// run two steps for the same session concurrently.
    pub async fn classify_step(
        &self,
        session_id: &str,
        query: &str,
    ) -> Result<ClassificationOutcome> {
        let session = self
            .store
            .append_message(session_id, Role::User, query)
            .await?;

        if session.is_final {
            info!(session_id, path = ?session.path, "Session already final");
            return Ok(ClassificationOutcome::AlreadyFinal(session.path));
        }

        let mut path = session.path;
        let history = session.history;

        if self.tree.is_leaf(&path) {
            warn!(session_id, ?path, "Stored path ends at a leaf, marking session final");
            self.store.set_final(session_id, true).await?;
            return Ok(ClassificationOutcome::AlreadyFinal(path));
        }

        if !self.tree.is_valid(&path) {
            warn!(
                session_id,
                ?path,
                fingerprint = %self.tree.fingerprint(),
                "Stored path does not resolve in the department tree"
            );
            return self.clarify(session_id, query, &[], &history).await;
        }

        let mut candidates = self.tree.candidates_at(&path);
        let mut levels = 0;

        loop {
            if levels >= self.max_depth {
                error!(
                    session_id,
                    ?path,
                    max_depth = self.max_depth,
                    "Descent limit reached before a leaf"
                );
                return Ok(ClassificationOutcome::Descended(path));
            }

            let classification = self.gateway.classify(query, &candidates, &history).await?;
            levels += 1;

            let matched = classification
                .matched
                .filter(|id| Self::offered(id, &candidates, session_id));

            let Some(matched) = matched else {
                return self.clarify(session_id, query, &candidates, &history).await;
            };

            debug!(session_id, depth = path.len() + 1, %matched, "Matched department");
            path.push(matched);
            self.store.set_path(session_id, &path).await?;

            if self.tree.is_leaf(&path) {
                self.store.set_final(session_id, true).await?;
                self.store
                    .append_message(session_id, Role::Assistant, &render_resolution(&path))
                    .await?;

                info!(session_id, ?path, levels, "Final department reached");
                return Ok(ClassificationOutcome::FinalReached(path));
            }

            candidates = self.tree.candidates_at(&path);
        }
    }

    /// Ask for clarification and record the question.
    async fn clarify(
        &self,
        session_id: &str,
        query: &str,
        candidates: &[Candidate],
        history: &[Message],
    ) -> Result<ClassificationOutcome> {
        let question = self
            .gateway
            .ask_clarifying_question(query, candidates, history)
            .await?;

        self.store
            .append_message(session_id, Role::Assistant, &question)
            .await?;

        info!(session_id, "Clarification requested");
        Ok(ClassificationOutcome::ClarificationNeeded(question))
    }

    fn offered(id: &str, candidates: &[Candidate], session_id: &str) -> bool {
        let offered = candidates.iter().any(|c| c.id == id);
        if !offered {
            warn!(session_id, matched = %id, "Classifier returned an id that was not offered");
        }
        offered
    }

    /// The full session record.
    pub async fn session(&self, session_id: &str) -> Result<Session> {
        Ok(self.store.read(session_id).await?)
    }

    /// The session transcript, oldest first.
    pub async fn get_transcript(&self, session_id: &str) -> Result<Vec<Message>> {
        Ok(self.session(session_id).await?.history)
    }

    /// The session's current path.
    pub async fn get_path(&self, session_id: &str) -> Result<Vec<String>> {
        Ok(self.session(session_id).await?.path)
    }

    /// Whether the session has reached a leaf.
    pub async fn is_final(&self, session_id: &str) -> Result<bool> {
        Ok(self.session(session_id).await?.is_final)
    }

    /// Derived state of the session.
    pub async fn session_state(&self, session_id: &str) -> Result<TraversalState> {
        Ok(TraversalState::of(&self.session(session_id).await?))
    }
}
