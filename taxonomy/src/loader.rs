//! Tree document loading and validation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::node::TreeNode;
use crate::schema::{decode_forest, TreeFormat, TreeSchema};
use crate::tree::{DepartmentTree, DEFAULT_MAX_DEPTH};

/// Error types for tree loading.
#[derive(Debug, thiserror::Error)]
pub enum TaxonomyError {
    /// Document decoded but violates a tree invariant, or failed to decode
    #[error("Malformed tree: {0}")]
    Malformed(String),

    /// Tree source could not be read
    #[error("Failed to read tree source {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// No format given and none could be inferred
    #[error("Cannot infer tree format from '{0}' (expected .json, .yaml or .yml)")]
    UnknownFormat(String),
}

/// Where a tree document comes from.
#[derive(Debug, Clone)]
pub enum TreeSource {
    /// A file on disk; format inferred from its extension unless overridden
    File(PathBuf),
    /// An in-memory document
    Text { text: String, format: TreeFormat },
}

/// Loads department trees in a declared schema.
#[derive(Debug, Clone)]
pub struct TreeLoader {
    schema: TreeSchema,
    format: Option<TreeFormat>,
    max_depth: usize,
}

impl TreeLoader {
    /// Create a loader for documents in the given schema.
    pub fn new(schema: TreeSchema) -> Self {
        Self {
            schema,
            format: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Force a format instead of inferring it from the file extension.
    pub fn with_format(mut self, format: TreeFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Set the maximum nesting depth accepted.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn schema(&self) -> TreeSchema {
        self.schema
    }

    /// Load and validate a tree.
    pub fn load(&self, source: &TreeSource) -> Result<DepartmentTree, TaxonomyError> {
        match source {
            TreeSource::File(path) => self.load_file(path),
            TreeSource::Text { text, format } => {
                self.load_str(text, self.format.unwrap_or(*format))
            }
        }
    }

    /// Load and validate a tree from a file.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<DepartmentTree, TaxonomyError> {
        let path = path.as_ref();
        let format = self
            .format
            .or_else(|| TreeFormat::from_path(path))
            .ok_or_else(|| TaxonomyError::UnknownFormat(path.display().to_string()))?;

        let text = std::fs::read_to_string(path).map_err(|source| TaxonomyError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let tree = self.load_str(&text, format)?;
        tracing::info!(
            path = %path.display(),
            schema = %self.schema,
            nodes = tree.node_count(),
            depth = tree.depth(),
            fingerprint = %tree.fingerprint(),
            "Loaded department tree"
        );
        Ok(tree)
    }

    /// Load and validate a tree from document text.
    pub fn load_str(&self, text: &str, format: TreeFormat) -> Result<DepartmentTree, TaxonomyError> {
        let departments = decode_forest(text, self.schema, format)?;
        DepartmentTree::with_max_depth(departments, self.max_depth)
    }
}

/// Check tree invariants over a forest of top-level departments.
pub(crate) fn validate_forest(
    departments: &[TreeNode],
    max_depth: usize,
) -> Result<(), TaxonomyError> {
    if departments.is_empty() {
        return Err(TaxonomyError::Malformed(
            "tree has no top-level departments".to_string(),
        ));
    }
    validate_siblings(departments, &mut Vec::new(), max_depth)
}

fn validate_siblings<'a>(
    siblings: &'a [TreeNode],
    trail: &mut Vec<&'a str>,
    max_depth: usize,
) -> Result<(), TaxonomyError> {
    if !siblings.is_empty() && trail.len() >= max_depth {
        return Err(TaxonomyError::Malformed(format!(
            "nesting below '{}' exceeds maximum depth {}",
            trail.join(" > "),
            max_depth
        )));
    }

    let mut seen = HashSet::new();
    for node in siblings {
        if node.id.trim().is_empty() {
            return Err(TaxonomyError::Malformed(format!(
                "empty id under '{}'",
                location(trail)
            )));
        }
        if !seen.insert(node.id.as_str()) {
            return Err(TaxonomyError::Malformed(format!(
                "duplicate id '{}' under '{}'",
                node.id,
                location(trail)
            )));
        }

        trail.push(&node.id);
        validate_siblings(&node.children, trail, max_depth)?;
        trail.pop();
    }
    Ok(())
}

fn location(trail: &[&str]) -> String {
    if trail.is_empty() {
        crate::tree::ROOT_ID.to_string()
    } else {
        trail.join(" > ")
    }
}
