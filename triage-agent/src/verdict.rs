//! Strict decoding of model replies.
//!
//! Model output is never trusted to be well-formed. Anything that is not an
//! unambiguous, in-range verdict is reported as [`Verdict::Malformed`] so the
//! caller can treat it as "no match".

use serde_json::Value;
use taxonomy::Candidate;

/// Decoded classification reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// One of the offered candidates, by its exact id
    Found(String),
    /// The model explicitly declined to choose
    NotFound,
    /// The reply could not be understood
    Malformed(String),
}

impl Verdict {
    /// The matched id, if any.
    pub fn into_match(self) -> Option<String> {
        match self {
            Verdict::Found(id) => Some(id),
            Verdict::NotFound | Verdict::Malformed(_) => None,
        }
    }
}

/// Strip one surrounding Markdown code fence, if present.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop an info string such as `json`
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None => body.trim(),
    }
}

fn parse_object(raw: &str) -> Result<serde_json::Map<String, Value>, String> {
    match serde_json::from_str::<Value>(strip_code_fence(raw)) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("expected a JSON object, got {}", kind(&other))),
        Err(e) => Err(format!("invalid JSON: {}", e)),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decode a classification reply against the candidates that were offered.
///
/// A `found` verdict must name an offered id. Exact matches win; otherwise a
/// single case-insensitive match is accepted and mapped to the exact id.
pub fn decode_classification(raw: &str, candidates: &[Candidate]) -> Verdict {
    let object = match parse_object(raw) {
        Ok(object) => object,
        Err(reason) => return Verdict::Malformed(reason),
    };

    let status = match object.get("status").and_then(Value::as_str) {
        Some(status) => status.trim().to_ascii_lowercase(),
        None => return Verdict::Malformed("missing string field 'status'".to_string()),
    };

    match status.as_str() {
        "not found" | "not_found" => Verdict::NotFound,
        "found" => {
            let Some(name) = object
                .get("classified_department")
                .and_then(Value::as_str)
                .map(str::trim)
            else {
                return Verdict::Malformed(
                    "status 'found' without a department name".to_string(),
                );
            };
            match_candidate(name, candidates)
        }
        other => Verdict::Malformed(format!("unknown status '{}'", other)),
    }
}

fn match_candidate(name: &str, candidates: &[Candidate]) -> Verdict {
    if let Some(exact) = candidates.iter().find(|c| c.id == name) {
        return Verdict::Found(exact.id.clone());
    }

    let folded: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| c.id.eq_ignore_ascii_case(name))
        .collect();

    match folded.as_slice() {
        [only] => Verdict::Found(only.id.clone()),
        [] => Verdict::Malformed(format!("department '{}' was not offered", name)),
        _ => Verdict::Malformed(format!("department '{}' is ambiguous", name)),
    }
}

/// Decode a clarifying-question reply.
pub fn decode_question(raw: &str) -> Result<String, String> {
    let object = parse_object(raw)?;
    object
        .get("clarifying_question")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(String::from)
        .ok_or_else(|| "missing or empty 'clarifying_question'".to_string())
}

/// Question used when the model's clarification cannot be decoded.
pub fn fallback_question(candidates: &[Candidate]) -> String {
    if candidates.is_empty() {
        return "Could you describe your grievance in a little more detail?".to_string();
    }

    let options = candidates
        .iter()
        .map(|c| c.id.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Could you tell me a bit more about your grievance? For example, does it concern: {}?",
        options
    )
}
