//! External tree document schemas and their adapters.
//!
//! Two field namings exist in deployed taxonomies besides the canonical one.
//! A document is always decoded with the schema it declares; the adapter
//! structs reject unknown fields so a document in the wrong schema fails to
//! load instead of producing an empty or partial tree.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::loader::TaxonomyError;
use crate::node::TreeNode;

/// Field naming used by a tree document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TreeSchema {
    /// `id` / `summary` / `children`
    #[default]
    Canonical,
    /// `name` / `summary` / `children`
    NameChildren,
    /// `topic` / `summary` / `sub_departments`
    TopicSubDepartments,
}

impl TreeSchema {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Canonical => "canonical",
            Self::NameChildren => "name-children",
            Self::TopicSubDepartments => "topic-sub-departments",
        }
    }
}

impl fmt::Display for TreeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TreeSchema {
    type Err = TaxonomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "canonical" => Ok(Self::Canonical),
            "name-children" => Ok(Self::NameChildren),
            "topic-sub-departments" => Ok(Self::TopicSubDepartments),
            other => Err(TaxonomyError::Malformed(format!(
                "unknown tree schema '{}'",
                other
            ))),
        }
    }
}

/// Serialization format of a tree document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeFormat {
    Json,
    Yaml,
}

impl TreeFormat {
    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

impl fmt::Display for TreeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("JSON"),
            Self::Yaml => f.write_str("YAML"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NameChildrenNode {
    name: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    children: Option<Vec<NameChildrenNode>>,
}

impl From<NameChildrenNode> for TreeNode {
    fn from(node: NameChildrenNode) -> Self {
        TreeNode {
            id: node.name,
            summary: node.summary.unwrap_or_default(),
            children: node
                .children
                .unwrap_or_default()
                .into_iter()
                .map(TreeNode::from)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TopicNode {
    topic: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    sub_departments: Option<Vec<TopicNode>>,
}

impl From<TopicNode> for TreeNode {
    fn from(node: TopicNode) -> Self {
        TreeNode {
            id: node.topic,
            summary: node.summary.unwrap_or_default(),
            children: node
                .sub_departments
                .unwrap_or_default()
                .into_iter()
                .map(TreeNode::from)
                .collect(),
        }
    }
}

fn parse<T: DeserializeOwned>(text: &str, format: TreeFormat) -> Result<T, TaxonomyError> {
    let result = match format {
        TreeFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        TreeFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
    };
    result.map_err(|message| {
        TaxonomyError::Malformed(format!("invalid {} document: {}", format, message))
    })
}

/// Decode a list of top-level departments into canonical nodes.
pub(crate) fn decode_forest(
    text: &str,
    schema: TreeSchema,
    format: TreeFormat,
) -> Result<Vec<TreeNode>, TaxonomyError> {
    let nodes = match schema {
        TreeSchema::Canonical => parse::<Vec<TreeNode>>(text, format)?,
        TreeSchema::NameChildren => parse::<Vec<NameChildrenNode>>(text, format)?
            .into_iter()
            .map(TreeNode::from)
            .collect(),
        TreeSchema::TopicSubDepartments => parse::<Vec<TopicNode>>(text, format)?
            .into_iter()
            .map(TreeNode::from)
            .collect(),
    };
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOPIC_JSON: &str = r#"[
        {
            "topic": "Hostel",
            "summary": "Accommodation and food.",
            "sub_departments": [
                {"topic": "Mess", "summary": "Food quality and billing."},
                {"topic": "Room Allocation", "summary": "Allotment changes."}
            ]
        }
    ]"#;

    #[test]
    fn test_topic_schema_adapter() {
        let nodes =
            decode_forest(TOPIC_JSON, TreeSchema::TopicSubDepartments, TreeFormat::Json).unwrap();

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id, "Hostel");
        assert_eq!(nodes[0].children[1].id, "Room Allocation");
        assert!(nodes[0].children[0].is_leaf());
    }

    #[test]
    fn test_name_schema_adapter_yaml() {
        let yaml = r#"
- name: Agriculture
  children:
    - name: Dept of Agriculture
      summary: Central schemes
      children:
        - name: PM-KISAN
"#;
        let nodes = decode_forest(yaml, TreeSchema::NameChildren, TreeFormat::Yaml).unwrap();

        assert_eq!(nodes[0].summary, "");
        assert_eq!(nodes[0].children[0].children[0].id, "PM-KISAN");
    }

    #[test]
    fn test_cross_schema_document_is_rejected() {
        let err = decode_forest(TOPIC_JSON, TreeSchema::NameChildren, TreeFormat::Json);
        assert!(matches!(err, Err(TaxonomyError::Malformed(_))));

        let err = decode_forest(TOPIC_JSON, TreeSchema::Canonical, TreeFormat::Json);
        assert!(matches!(err, Err(TaxonomyError::Malformed(_))));
    }

    #[test]
    fn test_canonical_requires_summary() {
        let json = r#"[{"id": "A", "children": []}]"#;
        let err = decode_forest(json, TreeSchema::Canonical, TreeFormat::Json);
        assert!(matches!(err, Err(TaxonomyError::Malformed(_))));
    }

    #[test]
    fn test_schema_and_format_parsing() {
        assert_eq!(
            "topic-sub-departments".parse::<TreeSchema>().unwrap(),
            TreeSchema::TopicSubDepartments
        );
        assert!("topic".parse::<TreeSchema>().is_err());
        assert_eq!(
            TreeFormat::from_path(Path::new("tree.YML")),
            Some(TreeFormat::Yaml)
        );
        assert_eq!(TreeFormat::from_path(Path::new("tree.txt")), None);
    }
}
