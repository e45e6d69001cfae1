//! Grievance Triage - Session-Backed Department Traversal
//!
//! Routes free-text grievances down a department tree, one classifier call
//! per level, keeping each conversation in a durable session record.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    TraversalEngine                      │
//! │  classify_step / initiate_session / transcript access   │
//! └──────┬──────────────────┬─────────────────────┬─────────┘
//!        │                  │                     │
//!        ▼                  ▼                     ▼
//! ┌─────────────┐   ┌───────────────┐   ┌───────────────────┐
//! │ Department  │   │ SessionStore  │   │ ClassifierGateway │
//! │ Tree        │   │ (file/memory) │   │ (LLM classifier)  │
//! │ (taxonomy)  │   │               │   │ (triage-agent)    │
//! └─────────────┘   └───────────────┘   └───────────────────┘
//! ```
//!
//! # Step outcomes
//!
//! - **FinalReached**: a leaf department was matched during the step
//! - **AlreadyFinal**: the session had already been routed
//! - **ClarificationNeeded**: the classifier could not decide; a question
//!   was appended to the transcript
//! - **Descended**: the per-step descent limit stopped the walk early
//!
//! Steps on the same session must not overlap; [`SessionGate`] provides the
//! per-session lock front ends use for that. With a lock directory it also
//! holds a file lock, so processes sharing a session directory take turns.

pub mod cli;
pub mod config;
pub mod console;
pub mod engine;
pub mod gate;
pub mod session;
pub mod state;
pub mod types;

pub use config::{ConfigError, SessionBackend, TriageConfig};
pub use engine::TraversalEngine;
pub use gate::{SessionGate, SessionGuard};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore, StoreError};
pub use state::TraversalState;
pub use types::{ClassificationOutcome, Result, TriageError};
