//! Triage Agent - Language-Model Classifier Gateway
//!
//! Provides the classifier the traversal engine consults at every tree level:
//! - Trait-based LLM backends (OpenAI-compatible HTTP, scripted mock)
//! - Prompt assembly for classification and clarifying questions
//! - Strict decoding of model verdicts that degrades to "no match"
//!   instead of failing
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │    ClassifierGateway (LlmClassifier)    │
//! │   classify / ask_clarifying_question    │
//! └────────────────┬────────────────────────┘
//!                  │
//!      ┌───────────┴───────────┐
//!      ▼                       ▼
//! ┌─────────────┐       ┌──────────────┐
//! │ LlmBackend  │       │ Prompt +     │
//! │ (OpenAI/    │       │ verdict      │
//! │  Mock)      │       │ decoding     │
//! └─────────────┘       └──────────────┘
//! ```

pub mod backend;
pub mod gateway;
pub mod prompt;
pub mod types;
pub mod verdict;

// Re-export main types for convenience
pub use backend::traits::{CompletionRequest, CompletionResponse, LlmBackend, LlmError};
pub use gateway::{Classification, ClassifierGateway, ClassifierSettings, GatewayError, LlmClassifier};
pub use types::{Message, Role};
