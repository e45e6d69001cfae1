//! Command-line arguments for the `triage` binary.
//!
//! Flags override the YAML config file; each flag also reads an environment
//! variable so deployments can configure the binary without a file.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use taxonomy::TreeSchema;

use crate::config::{ConfigError, SessionBackend, TriageConfig};

/// Grievance triage - route a grievance to its department
#[derive(Parser, Debug, Clone)]
#[command(name = "triage")]
#[command(about = "Route grievances down a department tree with an LLM classifier")]
pub struct Args {
    /// YAML config file
    #[arg(long, env = "TRIAGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Department tree document (JSON or YAML)
    #[arg(long, env = "TRIAGE_TREE")]
    pub tree: Option<PathBuf>,

    /// Field naming of the tree document
    #[arg(long, env = "TRIAGE_TREE_SCHEMA")]
    pub schema: Option<TreeSchema>,

    /// Directory holding one JSON record per session
    #[arg(long, env = "TRIAGE_SESSIONS_DIR")]
    pub sessions_dir: Option<PathBuf>,

    /// Keep sessions in memory only
    #[arg(long, env = "TRIAGE_MEMORY_SESSIONS", default_value = "false")]
    pub memory_sessions: bool,

    /// OpenAI-compatible API root
    #[arg(long, env = "TRIAGE_BASE_URL")]
    pub base_url: Option<String>,

    /// Classifier model name
    #[arg(long, env = "TRIAGE_MODEL")]
    pub model: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a session and print its id
    Init,
    /// Run one classification step for a session
    Ask {
        /// Session id
        session: String,
        /// Grievance text or answer to the last question
        query: String,
    },
    /// Print a session's transcript and department path
    Show {
        /// Session id
        session: String,
    },
    /// Interactive loop; starts a new session once one is routed
    Chat {
        /// Resume an existing session
        #[arg(long)]
        session: Option<String>,
    },
    /// Print the loaded department tree
    Tree,
}

impl Args {
    /// Load the config file (or defaults), apply flag overrides and validate.
    pub fn resolve_config(&self) -> Result<TriageConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => TriageConfig::from_file(path)?,
            None => TriageConfig::default(),
        };
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut TriageConfig) {
        if let Some(tree) = &self.tree {
            config.tree.path = tree.clone();
        }
        if let Some(schema) = self.schema {
            config.tree.schema = schema;
        }
        if let Some(dir) = &self.sessions_dir {
            config.sessions.backend = SessionBackend::File;
            config.sessions.dir = dir.clone();
        }
        if self.memory_sessions {
            config.sessions.backend = SessionBackend::Memory;
        }
        if let Some(base_url) = &self.base_url {
            config.classifier.base_url = base_url.clone();
        }
        if let Some(model) = &self.model {
            config.classifier.model = model.clone();
        }
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_ask() {
        let args = Args::try_parse_from([
            "triage",
            "--tree",
            "data/university.json",
            "--schema",
            "topic-sub-departments",
            "ask",
            "abc",
            "The hostel wifi is down",
        ])
        .unwrap();

        assert_eq!(
            args.command,
            Command::Ask {
                session: "abc".to_string(),
                query: "The hostel wifi is down".to_string(),
            }
        );
        assert_eq!(args.schema, Some(TreeSchema::TopicSubDepartments));
    }

    #[test]
    fn test_rejects_unknown_schema() {
        let result = Args::try_parse_from(["triage", "--schema", "flat", "tree"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "tree:\n  path: from-file.json\nclassifier:\n  model: from-file\n"
        )
        .unwrap();

        let args = Args::try_parse_from([
            "triage",
            "--config",
            file.path().to_str().unwrap(),
            "--model",
            "from-flag",
            "--memory-sessions",
            "init",
        ])
        .unwrap();

        let config = args.resolve_config().unwrap();
        assert_eq!(config.tree.path, PathBuf::from("from-file.json"));
        assert_eq!(config.classifier.model, "from-flag");
        assert_eq!(config.sessions.backend, SessionBackend::Memory);
    }
}
