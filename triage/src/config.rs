//! Configuration for the triage service.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use taxonomy::{TreeFormat, TreeLoader, TreeSchema, TreeSource, DEFAULT_MAX_DEPTH};
use triage_agent::ClassifierSettings;

/// Error types for configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid YAML for this shape
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    /// Department tree source
    pub tree: TreeConfig,
    /// Session persistence
    pub sessions: SessionsConfig,
    /// Language-model classifier
    pub classifier: ClassifierConfig,
    /// Traversal limits
    pub traversal: TraversalConfig,
    /// General settings
    pub general: GeneralConfig,
}

impl TriageConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Load config from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tree.max_depth == 0 {
            return Err(ConfigError::Invalid("tree.max_depth must be at least 1".into()));
        }
        if self.traversal.max_depth == 0 {
            return Err(ConfigError::Invalid(
                "traversal.max_depth must be at least 1".into(),
            ));
        }
        if self.sessions.backend == SessionBackend::File
            && self.sessions.dir.as_os_str().is_empty()
        {
            return Err(ConfigError::Invalid(
                "sessions.dir is required for the file backend".into(),
            ));
        }
        for (name, value) in [
            ("classify_temperature", self.classifier.classify_temperature),
            ("question_temperature", self.classifier.question_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "classifier.{} must be within 0.0..=2.0, got {}",
                    name, value
                )));
            }
        }
        if self.classifier.model.trim().is_empty() {
            return Err(ConfigError::Invalid("classifier.model is required".into()));
        }
        if self.classifier.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "classifier.timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Department tree source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Tree document path
    pub path: PathBuf,
    /// Field naming of the document
    pub schema: TreeSchema,
    /// Format override; inferred from the extension when absent
    pub format: Option<TreeFormat>,
    /// Deepest nesting the loader accepts
    pub max_depth: usize,
}

impl TreeConfig {
    /// Loader for this document's schema, format and depth limit.
    pub fn loader(&self) -> TreeLoader {
        let loader = TreeLoader::new(self.schema).with_max_depth(self.max_depth);
        match self.format {
            Some(format) => loader.with_format(format),
            None => loader,
        }
    }

    pub fn source(&self) -> TreeSource {
        TreeSource::File(self.path.clone())
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("departments.json"),
            schema: TreeSchema::default(),
            format: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Where session records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// One JSON document per session
    #[default]
    File,
    /// Process memory only
    Memory,
}

/// Session persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    pub backend: SessionBackend,
    /// Directory for the file backend
    pub dir: PathBuf,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::File,
            dir: PathBuf::from("chat_history"),
        }
    }
}

/// Language-model classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// OpenAI-compatible API root
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    pub classify_temperature: f32,
    pub question_temperature: f32,
    pub max_tokens: Option<u32>,
    /// Per-request timeout (milliseconds)
    pub timeout_ms: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        let settings = ClassifierSettings::default();
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key_env: Some("GEMINI_API_KEY".to_string()),
            classify_temperature: settings.classify_temperature,
            question_temperature: settings.question_temperature,
            max_tokens: settings.max_tokens,
            timeout_ms: 30_000,
        }
    }
}

impl ClassifierConfig {
    pub fn settings(&self) -> ClassifierSettings {
        ClassifierSettings {
            classify_temperature: self.classify_temperature,
            question_temperature: self.question_temperature,
            max_tokens: self.max_tokens,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The API key from the configured environment variable, if set.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|key| !key.is_empty())
    }
}

/// Traversal limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Most levels descended in one step
    pub max_depth: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TriageConfig::default();

        assert_eq!(config.sessions.dir, PathBuf::from("chat_history"));
        assert_eq!(config.classifier.classify_temperature, 0.5);
        assert_eq!(config.classifier.question_temperature, 0.125);
        assert_eq!(config.traversal.max_depth, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
tree:
  path: data/university.json
  schema: topic-sub-departments
sessions:
  backend: memory
classifier:
  model: llama3
  base_url: http://localhost:11434/v1
  api_key_env: null
"#;
        let config = TriageConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.tree.schema, TreeSchema::TopicSubDepartments);
        assert_eq!(config.tree.format, None);
        assert_eq!(config.sessions.backend, SessionBackend::Memory);
        assert_eq!(config.classifier.model, "llama3");
        assert_eq!(config.classifier.api_key(), None);
        assert_eq!(config.classifier.timeout_ms, 30_000);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_yaml_round_trip() {
        let mut config = TriageConfig::default();
        config.tree.format = Some(TreeFormat::Yaml);
        config.traversal.max_depth = 8;

        let yaml = config.to_yaml().unwrap();
        let back = TriageConfig::from_yaml(&yaml).unwrap();

        assert_eq!(back.tree.format, Some(TreeFormat::Yaml));
        assert_eq!(back.traversal.max_depth, 8);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = TriageConfig::default();
        config.traversal.max_depth = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = TriageConfig::default();
        config.classifier.classify_temperature = 3.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = TriageConfig::default();
        config.sessions.dir = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_schema_is_parse_error() {
        let err = TriageConfig::from_yaml("tree:\n  schema: nested-lists\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_tree_section_loads_document() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("departments.txt");
        std::fs::write(
            &path,
            r#"[{"name": "Hostel", "children": [{"name": "Mess"}]}]"#,
        )
        .unwrap();

        let mut config = TriageConfig::default();
        config.tree.path = path;
        config.tree.schema = TreeSchema::NameChildren;
        config.tree.format = Some(TreeFormat::Json);

        let tree = config.tree.loader().load(&config.tree.source()).unwrap();
        assert_eq!(tree.children_of(&[]), vec!["Hostel".to_string()]);

        config.tree.max_depth = 1;
        assert!(config.tree.loader().load(&config.tree.source()).is_err());
    }

    #[test]
    fn test_from_file_missing() {
        let err = TriageConfig::from_file("/nonexistent/triage.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
