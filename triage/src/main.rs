//! Grievance triage command-line driver.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taxonomy::{render_resolution, DepartmentTree};
use triage::cli::{Args, Command};
use triage::console::{render_outcome, run_chat};
use triage::{
    FileSessionStore, MemorySessionStore, SessionBackend, SessionGate, SessionStore,
    TraversalEngine, TriageConfig,
};
use triage_agent::backend::{LlmBackend, OpenAiBackend};
use triage_agent::LlmClassifier;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let config = args.resolve_config().context("Invalid configuration")?;

    // Logs go to stderr so transcripts on stdout stay clean
    let log_level = config.general.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "triage={0},triage_agent={0},taxonomy={0},warn",
                    log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let tree = Arc::new(load_tree(&config)?);

    if args.command == Command::Tree {
        print!("{}", tree.render_outline());
        println!();
        println!("departments: {}  depth: {}", tree.node_count(), tree.depth());
        println!("fingerprint: {}", tree.fingerprint());
        return Ok(());
    }

    let classifier = build_classifier(&config)?;
    if matches!(args.command, Command::Ask { .. } | Command::Chat { .. })
        && !classifier.backend().is_available().await
    {
        warn!(
            backend = classifier.backend().id(),
            base_url = %config.classifier.base_url,
            "Classifier endpoint is not reachable, steps will fail until it is"
        );
    }

    let engine = build_engine(&config, tree, classifier);
    let gate = build_gate(&config);

    match args.command {
        Command::Init => {
            let id = engine.initiate_session().await?;
            println!("{}", id);
        }
        Command::Ask { session, query } => {
            let _guard = gate.lock(&session).await?;
            let outcome = engine.classify_step(&session, &query).await?;
            println!("{}", render_outcome(&outcome));
        }
        Command::Show { session } => show_session(&engine, &session).await?,
        Command::Chat { session } => {
            let mut stdout = std::io::stdout();
            run_chat(&engine, &gate, session, tokio::io::stdin(), &mut stdout).await?
        }
        Command::Tree => {}
    }

    Ok(())
}

fn load_tree(config: &TriageConfig) -> Result<DepartmentTree> {
    config.tree.loader().load(&config.tree.source()).with_context(|| {
        format!(
            "Failed to load department tree from {} ({} schema)",
            config.tree.path.display(),
            config.tree.schema
        )
    })
}

fn build_classifier(config: &TriageConfig) -> Result<LlmClassifier> {
    let classifier = &config.classifier;
    let api_key = classifier.api_key();
    if api_key.is_none() {
        if let Some(name) = &classifier.api_key_env {
            warn!(env = %name, "API key variable is not set, calling the classifier without a key");
        }
    }

    let backend = OpenAiBackend::new(
        &classifier.base_url,
        &classifier.model,
        api_key,
        classifier.timeout(),
    )
    .context("Failed to create classifier backend")?;

    info!(
        model = %classifier.model,
        base_url = %classifier.base_url,
        "Classifier configured"
    );

    Ok(LlmClassifier::new(Arc::new(backend)).with_settings(classifier.settings()))
}

fn build_engine(
    config: &TriageConfig,
    tree: Arc<DepartmentTree>,
    classifier: LlmClassifier,
) -> TraversalEngine {
    let store: Arc<dyn SessionStore> = match config.sessions.backend {
        SessionBackend::File => Arc::new(FileSessionStore::new(&config.sessions.dir)),
        SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
    };
    info!(sessions = ?config.sessions.backend, "Session store configured");

    TraversalEngine::new(tree, store, Arc::new(classifier))
        .with_max_depth(config.traversal.max_depth)
}

/// File-backed sessions are shared between processes, so their steps also
/// take a lock file next to the record.
fn build_gate(config: &TriageConfig) -> SessionGate {
    match config.sessions.backend {
        SessionBackend::File => SessionGate::with_lock_dir(&config.sessions.dir),
        SessionBackend::Memory => SessionGate::new(),
    }
}

async fn show_session(engine: &TraversalEngine, session_id: &str) -> Result<()> {
    let session = engine.session(session_id).await?;
    let state = engine.session_state(session_id).await?;

    println!("session: {}  state: {}  updated: {}", session.id, state, session.last_updated);
    for message in &session.history {
        println!("[{}] {}", message.role.as_str(), message.content);
    }
    println!();
    println!("{}", render_resolution(&session.path));
    Ok(())
}
