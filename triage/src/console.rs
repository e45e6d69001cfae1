//! Interactive console front end.
//!
//! Reads one grievance message per line and runs a classification step for
//! each. Blank lines are ignored and `exit` ends the conversation. A
//! classifier failure is reported and the conversation continues on the same
//! session. Once a session is routed, a fresh one is started.

use std::io::Write;

use anyhow::Result;
use taxonomy::render_resolution;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{info, warn};
use triage_agent::Role;

use crate::engine::TraversalEngine;
use crate::gate::SessionGate;
use crate::types::{ClassificationOutcome, TriageError};

/// User-facing text for a step outcome.
pub fn render_outcome(outcome: &ClassificationOutcome) -> String {
    match outcome {
        ClassificationOutcome::FinalReached(path) => {
            format!("Your grievance has been routed to:\n\n{}", render_resolution(path))
        }
        ClassificationOutcome::AlreadyFinal(path) => format!(
            "This grievance has already been routed to:\n\n{}",
            render_resolution(path)
        ),
        ClassificationOutcome::ClarificationNeeded(question) => question.clone(),
        ClassificationOutcome::Descended(path) => {
            format!("Routing stopped at: {}", path.join(" > "))
        }
    }
}

/// Run a conversation until `exit` or end of input.
///
/// Resumes `resume` when given, otherwise starts a new session.
pub async fn run_chat<R, W>(
    engine: &TraversalEngine,
    gate: &SessionGate,
    resume: Option<String>,
    input: R,
    output: &mut W,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: Write,
{
    let mut session_id = match resume {
        Some(id) => id,
        None => engine.initiate_session().await?,
    };
    writeln!(
        output,
        "Session {} - describe your grievance (type exit to quit)",
        session_id
    )?;

    let mut lines = BufReader::new(input).lines();
    loop {
        write!(output, "> ")?;
        output.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case("exit") {
            break;
        }

        let step = {
            let _guard = gate.lock(&session_id).await?;
            engine.classify_step(&session_id, query).await
        };
        let outcome = match step {
            Ok(outcome) => outcome,
            Err(TriageError::Gateway(e)) => {
                warn!(session_id = %session_id, error = %e, "Classification step failed");
                writeln!(
                    output,
                    "The classifier is unavailable right now ({}). Please try again.",
                    e
                )?;
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        writeln!(output, "{}", render_outcome(&outcome))?;

        if outcome.is_final() {
            let transcript = engine.get_transcript(&session_id).await?;
            let turns = transcript.iter().filter(|m| m.role == Role::User).count();
            info!(session_id = %session_id, turns, "Session routed");

            session_id = engine.initiate_session().await?;
            writeln!(output, "\nNew session {} - describe another grievance", session_id)?;
        }
    }

    Ok(())
}
