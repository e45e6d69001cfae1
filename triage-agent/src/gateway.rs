//! Classifier gateway - the engine's view of the language model.
//!
//! The gateway answers two questions for one tree level: which candidate
//! does the query belong to, and, when none, what should the user be asked.
//! Only transport failures are errors; an unusable reply is a non-match.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use taxonomy::Candidate;

use crate::backend::traits::{CompletionRequest, LlmBackend, LlmError};
use crate::prompt::PromptAssembler;
use crate::types::Message;
use crate::verdict::{self, Verdict};

/// Error types for the gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Backend call failed at the transport level
    #[error("Classifier backend error: {0}")]
    Backend(#[from] LlmError),
}

/// Outcome of classifying a query at one level.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Classification {
    /// Matched candidate id, `None` when the model could not decide
    pub matched: Option<String>,
}

impl Classification {
    pub fn matched(id: impl Into<String>) -> Self {
        Self {
            matched: Some(id.into()),
        }
    }

    pub fn no_match() -> Self {
        Self { matched: None }
    }
}

/// The classifier consulted by the traversal engine.
#[async_trait]
pub trait ClassifierGateway: Send + Sync {
    /// Pick the candidate the query belongs to, if any.
    async fn classify(
        &self,
        query: &str,
        candidates: &[Candidate],
        history: &[Message],
    ) -> Result<Classification, GatewayError>;

    /// Produce a question that helps the user narrow down among candidates.
    async fn ask_clarifying_question(
        &self,
        query: &str,
        candidates: &[Candidate],
        history: &[Message],
    ) -> Result<String, GatewayError>;
}

/// Sampling settings for the two gateway calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierSettings {
    /// Temperature for classification
    pub classify_temperature: f32,
    /// Temperature for clarifying questions
    pub question_temperature: f32,
    /// Maximum tokens per reply
    pub max_tokens: Option<u32>,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            classify_temperature: 0.5,
            question_temperature: 0.125,
            max_tokens: Some(512),
        }
    }
}

/// Gateway backed by a chat-completion LLM.
pub struct LlmClassifier {
    backend: Arc<dyn LlmBackend>,
    settings: ClassifierSettings,
}

impl LlmClassifier {
    /// Create a classifier with default settings.
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            backend,
            settings: ClassifierSettings::default(),
        }
    }

    /// Create with custom settings.
    pub fn with_settings(mut self, settings: ClassifierSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn backend(&self) -> &Arc<dyn LlmBackend> {
        &self.backend
    }

    fn build_request(
        &self,
        system_prompt: String,
        query: &str,
        candidates: &[Candidate],
        history: &[Message],
        temperature: f32,
    ) -> CompletionRequest {
        CompletionRequest::with_history(history)
            .with_system(system_prompt)
            .with_message(Message::user(PromptAssembler::level_prompt(query, candidates)))
            .with_temperature(temperature)
            .with_max_tokens(self.settings.max_tokens)
            .with_json_output()
    }
}

#[async_trait]
impl ClassifierGateway for LlmClassifier {
    async fn classify(
        &self,
        query: &str,
        candidates: &[Candidate],
        history: &[Message],
    ) -> Result<Classification, GatewayError> {
        let request = self.build_request(
            PromptAssembler::classification_system_prompt(),
            query,
            candidates,
            history,
            self.settings.classify_temperature,
        );

        let start = Instant::now();
        let completion = self.backend.complete(request).await?;

        let verdict = verdict::decode_classification(&completion.content, candidates);
        if let Verdict::Malformed(reason) = &verdict {
            warn!(
                backend = %self.backend.id(),
                %reason,
                "Unusable classification reply, treating as no match"
            );
        }

        let classification = Classification {
            matched: verdict.into_match(),
        };
        debug!(
            backend = %self.backend.id(),
            candidates = candidates.len(),
            matched = ?classification.matched,
            tokens = completion.usage.total(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Classified query"
        );

        Ok(classification)
    }

    async fn ask_clarifying_question(
        &self,
        query: &str,
        candidates: &[Candidate],
        history: &[Message],
    ) -> Result<String, GatewayError> {
        let request = self.build_request(
            PromptAssembler::clarification_system_prompt(),
            query,
            candidates,
            history,
            self.settings.question_temperature,
        );

        let completion = self.backend.complete(request).await?;

        let question = verdict::decode_question(&completion.content).unwrap_or_else(|reason| {
            warn!(
                backend = %self.backend.id(),
                %reason,
                "Unusable clarifying question, using fallback"
            );
            verdict::fallback_question(candidates)
        });

        debug!(backend = %self.backend.id(), "Generated clarifying question");
        Ok(question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;

    fn options() -> Vec<Candidate> {
        vec![
            Candidate {
                id: "Academics".to_string(),
                summary: "Courses, exams, grades.".to_string(),
            },
            Candidate {
                id: "Hostel".to_string(),
                summary: "Accommodation and food.".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn test_classify_found() {
        let backend = Arc::new(
            MockBackend::default()
                .with_response(r#"{"classified_department": "Hostel", "status": "found"}"#),
        );
        let classifier = LlmClassifier::new(backend.clone());

        let history = vec![Message::user("The mess food is awful")];
        let result = classifier
            .classify("The mess food is awful", &options(), &history)
            .await
            .unwrap();

        assert_eq!(result, Classification::matched("Hostel"));

        let request = &backend.requests()[0];
        assert_eq!(request.messages.len(), 2);
        assert!(request.messages[1].content.contains("- Hostel: Accommodation and food."));
        assert_eq!(request.temperature, Some(0.5));
        assert!(request.json_output);
    }

    #[tokio::test]
    async fn test_classify_degrades_on_garbage() {
        let backend = Arc::new(MockBackend::default().with_response("I think it's the hostel"));
        let classifier = LlmClassifier::new(backend);

        let result = classifier.classify("food", &options(), &[]).await.unwrap();
        assert_eq!(result, Classification::no_match());
    }

    #[tokio::test]
    async fn test_classify_rejects_unoffered_id() {
        let backend = Arc::new(
            MockBackend::default()
                .with_response(r#"{"classified_department": "Library", "status": "found"}"#),
        );
        let classifier = LlmClassifier::new(backend);

        let result = classifier.classify("books", &options(), &[]).await.unwrap();
        assert_eq!(result.matched, None);
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let backend = Arc::new(MockBackend::default().then_fail(LlmError::Timeout));
        let classifier = LlmClassifier::new(backend);

        let err = classifier.classify("q", &options(), &[]).await.unwrap_err();
        assert!(matches!(err, GatewayError::Backend(LlmError::Timeout)));
    }

    #[tokio::test]
    async fn test_clarifying_question_and_fallback() {
        let backend = Arc::new(
            MockBackend::default()
                .then_respond(r#"{"clarifying_question": "Is this about food or your room?"}"#)
                .then_respond("not json"),
        );
        let classifier = LlmClassifier::new(backend.clone()).with_settings(ClassifierSettings {
            question_temperature: 0.2,
            ..Default::default()
        });

        let question = classifier
            .ask_clarifying_question("hostel issue", &options(), &[])
            .await
            .unwrap();
        assert_eq!(question, "Is this about food or your room?");
        assert_eq!(backend.requests()[0].temperature, Some(0.2));

        let fallback = classifier
            .ask_clarifying_question("hostel issue", &options(), &[])
            .await
            .unwrap();
        assert!(fallback.contains("Academics, Hostel"));
    }
}
