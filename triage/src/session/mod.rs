//! Durable per-conversation session records.
//!
//! A session holds the transcript, the current path into the department
//! tree and the final flag. Backends only implement whole-record `load` and
//! `save`; the mutating operations are provided on top of them by
//! [`SessionStore`] and are last-writer-wins.

pub mod file;
pub mod memory;
pub mod model;
pub mod store;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;
pub use model::Session;
pub use store::{validate_session_id, SessionStore, StoreError};
