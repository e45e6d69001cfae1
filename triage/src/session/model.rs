//! Session record.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use triage_agent::{Message, Role};

/// One conversation's routing state.
///
/// Serialized with the field names of the `chat_history/<id>.json` documents.
/// Records written by the earlier service are read as well: `path_final` may
/// be the string `"True"`/`"False"`, and `last_updated` may be empty or a
/// timestamp without offset (taken as UTC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "session_id")]
    pub id: String,
    /// Transcript, oldest first
    #[serde(default)]
    pub history: Vec<Message>,
    /// Node ids chosen so far, below the root
    #[serde(rename = "current_path", default)]
    pub path: Vec<String>,
    /// Set once a leaf has been reached
    #[serde(rename = "path_final", default, deserialize_with = "flag_or_text")]
    pub is_final: bool,
    #[serde(default = "Utc::now", deserialize_with = "lenient_timestamp")]
    pub last_updated: DateTime<Utc>,
    /// Bumped on every write
    #[serde(default)]
    pub revision: u64,
}

impl Session {
    /// A fresh, empty session at the root.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            history: Vec::new(),
            path: Vec::new(),
            is_final: false,
            last_updated: Utc::now(),
            revision: 0,
        }
    }

    /// Record a write.
    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
        self.revision += 1;
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.history.last()
    }

    /// Whether the transcript ends with an assistant turn.
    pub fn awaiting_user(&self) -> bool {
        self.last_message()
            .is_some_and(|m| m.role == Role::Assistant)
    }
}

/// `true`/`false`, or a string that is true only when it reads "true" in
/// any case.
fn flag_or_text<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(flag) => flag,
        Flag::Text(text) => text.trim().eq_ignore_ascii_case("true"),
    })
}

/// RFC 3339, or a naive ISO timestamp taken as UTC. Empty, null or
/// unparseable values become the current time.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(parse_timestamp)
        .unwrap_or_else(Utc::now))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_bumps_revision() {
        let mut session = Session::new("abc");
        let before = session.last_updated;

        session.touch();
        session.touch();

        assert_eq!(session.revision, 2);
        assert!(session.last_updated >= before);
    }

    #[test]
    fn test_serialized_field_names() {
        let mut session = Session::new("abc");
        session.history.push(Message::user("hostel wifi is down"));
        session.path = vec!["Hostel".to_string()];

        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["session_id"], "abc");
        assert_eq!(value["current_path"][0], "Hostel");
        assert_eq!(value["path_final"], false);
        assert_eq!(value["history"][0]["role"], "user");

        let back: Session = serde_json::from_value(value).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn test_reads_new_record_from_earlier_service() {
        let json = r#"{
  "session_id": "3f2b9c1e-8d4a-4b7e-9f00-1a2b3c4d5e6f",
  "history": [
    {
      "role": "user",
      "content": "hi"
    }
  ],
  "current_path": [],
  "path_final": "False",
  "last_updated": "2025-05-20T10:11:12.123456"
}"#;

        let session: Session = serde_json::from_str(json).unwrap();
        assert!(!session.is_final);
        assert_eq!(session.revision, 0);
        assert_eq!(
            session.last_updated.to_rfc3339(),
            "2025-05-20T10:11:12.123456+00:00"
        );
        assert!(!session.awaiting_user());
    }

    #[test]
    fn test_reads_final_record_and_empty_timestamp() {
        let json = r#"{
  "session_id": "abc",
  "history": [],
  "current_path": ["Hostel", "Mess", "Food Quality"],
  "path_final": "True",
  "last_updated": ""
}"#;

        let before = Utc::now();
        let session: Session = serde_json::from_str(json).unwrap();
        assert!(session.is_final);
        assert_eq!(session.path.len(), 3);
        assert!(session.last_updated >= before);

        let lowercase: Session =
            serde_json::from_str(&json.replace("\"True\"", "\"true\"")).unwrap();
        assert!(lowercase.is_final);
    }
}
