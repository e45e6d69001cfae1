//! The loaded, immutable department tree.
//!
//! Paths are sequences of sibling-unique ids starting below a synthetic root
//! whose children are the top-level departments. The empty path designates
//! the root itself.

use sha2::{Digest, Sha256};

use crate::loader::{validate_forest, TaxonomyError};
use crate::node::{Candidate, TreeNode};

/// Id of the synthetic root node. Never part of a path.
pub const ROOT_ID: &str = "root";

/// Default maximum nesting depth accepted by the loader.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// A validated department tree.
///
/// Built once at startup and shared read-only for the life of the process.
#[derive(Debug, Clone)]
pub struct DepartmentTree {
    root: TreeNode,
    fingerprint: String,
}

impl DepartmentTree {
    /// Build a tree from top-level departments with the default depth limit.
    pub fn from_departments(departments: Vec<TreeNode>) -> Result<Self, TaxonomyError> {
        Self::with_max_depth(departments, DEFAULT_MAX_DEPTH)
    }

    /// Build a tree from top-level departments, rejecting deeper nesting.
    pub fn with_max_depth(
        departments: Vec<TreeNode>,
        max_depth: usize,
    ) -> Result<Self, TaxonomyError> {
        validate_forest(&departments, max_depth)?;

        let root = TreeNode::new(ROOT_ID, "").with_children(departments);
        let fingerprint = Self::compute_fingerprint(&root);

        Ok(Self { root, fingerprint })
    }

    /// The synthetic root.
    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Top-level departments.
    pub fn departments(&self) -> &[TreeNode] {
        &self.root.children
    }

    /// SHA-256 of the canonical tree content.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Resolve a path to its node, or `None` if some id is not a child of
    /// the previous node.
    pub fn resolve(&self, path: &[String]) -> Option<&TreeNode> {
        path.iter()
            .try_fold(&self.root, |node, id| node.child(id))
    }

    /// Whether every id of the path names an actual child.
    pub fn is_valid(&self, path: &[String]) -> bool {
        self.resolve(path).is_some()
    }

    /// Child ids at the path. Empty when the path does not resolve.
    pub fn children_of(&self, path: &[String]) -> Vec<String> {
        self.resolve(path)
            .map(|node| node.children.iter().map(|c| c.id.clone()).collect())
            .unwrap_or_default()
    }

    /// Children at the path as classifier candidates. Empty when the path
    /// does not resolve.
    pub fn candidates_at(&self, path: &[String]) -> Vec<Candidate> {
        self.resolve(path)
            .map(|node| node.children.iter().map(Candidate::from).collect())
            .unwrap_or_default()
    }

    /// Whether the path resolves to a node without children.
    ///
    /// An unresolvable path is not a leaf.
    pub fn is_leaf(&self, path: &[String]) -> bool {
        self.resolve(path).is_some_and(TreeNode::is_leaf)
    }

    /// Length of the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        self.root.height()
    }

    /// Number of departments, excluding the synthetic root.
    pub fn node_count(&self) -> usize {
        self.root.subtree_size() - 1
    }

    /// Indented outline of the whole tree.
    pub fn render_outline(&self) -> String {
        let mut out = String::new();
        for dept in self.departments() {
            Self::outline_node(dept, 0, &mut out);
        }
        out
    }

    fn outline_node(node: &TreeNode, level: usize, out: &mut String) {
        out.push_str(&"  ".repeat(level));
        if node.summary.is_empty() {
            out.push_str(&format!("- {}\n", node.id));
        } else {
            out.push_str(&format!("- {}: {}\n", node.id, node.summary));
        }
        for child in &node.children {
            Self::outline_node(child, level + 1, out);
        }
    }

    fn compute_fingerprint(root: &TreeNode) -> String {
        let mut hasher = Sha256::new();
        Self::hash_node(root, &mut hasher);
        hex::encode(hasher.finalize())
    }

    fn hash_node(node: &TreeNode, hasher: &mut Sha256) {
        hasher.update(node.id.as_bytes());
        hasher.update([0x1f]);
        hasher.update(node.summary.as_bytes());
        hasher.update([0x1f]);
        hasher.update((node.children.len() as u64).to_le_bytes());
        for child in &node.children {
            Self::hash_node(child, hasher);
        }
    }
}

/// Render a resolved path as numbered department levels.
pub fn render_resolution(path: &[String]) -> String {
    if path.is_empty() {
        return "No department path available".to_string();
    }

    path.iter()
        .enumerate()
        .map(|(i, id)| format!("Department Level: {} Department Name: {}", i + 1, id))
        .collect::<Vec<_>>()
        .join("\n\n")
}
