//! Department Tree for Grievance Triage
//!
//! Loads the static topic hierarchy that grievance queries are routed down,
//! and answers the lookups the traversal engine needs:
//!
//! - **Canonical shape**: every node is `id` + `summary` + ordered `children`
//! - **Schema adapters**: external documents declare which field naming they
//!   use (`name`/`children` or `topic`/`sub_departments`) and are converted
//!   at load time, never inspected again afterwards
//! - **Fail-soft lookups**: a path that does not resolve yields no children
//!   rather than an error
//!
//! # Key Components
//!
//! - [`TreeLoader`]: Reads a JSON/YAML document in a declared [`TreeSchema`]
//! - [`DepartmentTree`]: Immutable, validated tree with a content fingerprint
//! - [`TreeNode`] / [`Candidate`]: Canonical node and the `{id, summary}` view
//!   handed to the classifier
//!
//! # Example
//!
//! ```ignore
//! use taxonomy::{TreeLoader, TreeSchema};
//!
//! let tree = TreeLoader::new(TreeSchema::TopicSubDepartments)
//!     .load_file("departments.json")?;
//! let options = tree.candidates_at(&["Hostel".to_string()]);
//! ```

pub mod loader;
pub mod node;
pub mod schema;
pub mod tree;

// Re-export main types
pub use loader::{TaxonomyError, TreeLoader, TreeSource};
pub use node::{Candidate, TreeNode};
pub use schema::{TreeFormat, TreeSchema};
pub use tree::{render_resolution, DepartmentTree, DEFAULT_MAX_DEPTH, ROOT_ID};
