//! Decoding of the assistant reply envelope.
//!
//! The completion backend answers every chat request with a JSON object of
//! this shape, even when it is reporting its own failure. Parsing is a pure
//! function: the same raw string always yields the same result and nothing
//! here touches shared state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentinel the model emits while an answer is still provisional.
pub const PLACEHOLDER_SENTINEL: &str = "...";

/// Shown to the user for any turn-level failure, regardless of cause.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// A retrieval citation attached by the backend. Passed through for display,
/// never interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagSource {
    pub id: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
    pub snippet: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub context_used: bool,
}

/// One assistant turn as the backend produces it.
///
/// `response`, `thinking`, `suggested_questions` and `debug` are required;
/// `response` and `thinking` may be empty strings. `id` and `ragSources` are
/// backend extras that ride along untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub response: String,
    pub thinking: String,
    pub suggested_questions: Vec<String>,
    pub debug: Diagnostics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "ragSources", default, skip_serializing_if = "Option::is_none")]
    pub rag_sources: Option<Vec<RagSource>>,
}

#[derive(Debug, Error)]
#[error("malformed assistant envelope: {0}")]
pub struct ParseError(#[from] serde_json::Error);

impl ResponseEnvelope {
    /// The synthetic envelope installed while the real reply is outstanding.
    pub fn pending() -> Self {
        Self {
            response: String::new(),
            thinking: "AI is processing...".to_string(),
            suggested_questions: Vec::new(),
            debug: Diagnostics {
                context_used: false,
            },
            id: None,
            rag_sources: None,
        }
    }

    /// The envelope recorded for a turn that ended in failure. Mirrors the
    /// backend's own apology payload so conversation history stays uniform.
    pub fn failure(message: &str) -> Self {
        Self {
            response: message.to_string(),
            thinking: "Error occurred".to_string(),
            suggested_questions: Vec::new(),
            debug: Diagnostics {
                context_used: false,
            },
            id: None,
            rag_sources: None,
        }
    }

    /// A decoded envelope counts as a finished answer only once `response`
    /// carries real text. An empty or `"..."` response means the model is
    /// still thinking and the turn stays pending.
    pub fn is_final(&self) -> bool {
        !self.response.is_empty() && self.response != PLACEHOLDER_SENTINEL
    }

    pub fn to_raw_payload(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Strictly decode a raw reply body. Missing fields and wrong field types
/// are parse errors; extra fields are not.
pub fn parse(raw: &str) -> Result<ResponseEnvelope, ParseError> {
    Ok(serde_json::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_complete_envelope() {
        let raw = r#"{
            "response": "Categories are A, B, C",
            "thinking": "Listing the award categories from context",
            "suggested_questions": ["How do I submit?"],
            "debug": {"context_used": true}
        }"#;
        let envelope = parse(raw).unwrap();
        assert_eq!(envelope.response, "Categories are A, B, C");
        assert_eq!(envelope.suggested_questions, vec!["How do I submit?"]);
        assert!(envelope.debug.context_used);
        assert!(envelope.is_final());
    }

    #[test]
    fn passes_citations_through() {
        let raw = r#"{
            "response": "The deadline is in March.",
            "thinking": "",
            "suggested_questions": [],
            "debug": {"context_used": true},
            "id": "b1946ac9",
            "ragSources": [
                {"id": "chunk-0", "fileName": "Schedule", "snippet": "March 14", "score": 0.91}
            ]
        }"#;
        let envelope = parse(raw).unwrap();
        let sources = envelope.rag_sources.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].file_name, "Schedule");
        assert_eq!(envelope.id.as_deref(), Some("b1946ac9"));
    }

    #[test]
    fn sentinel_response_is_not_final() {
        let raw = r#"{
            "response": "...",
            "thinking": "still working",
            "suggested_questions": [],
            "debug": {"context_used": false}
        }"#;
        let envelope = parse(raw).unwrap();
        assert!(!envelope.is_final());
    }

    #[test]
    fn pending_placeholder_is_not_final() {
        assert!(!ResponseEnvelope::pending().is_final());
    }

    #[test]
    fn missing_field_is_a_parse_error() {
        let raw = r#"{"response": "hi", "thinking": "", "debug": {"context_used": false}}"#;
        assert!(parse(raw).is_err());
    }

    #[test]
    fn wrong_field_type_is_a_parse_error() {
        let raw = r#"{
            "response": "hi",
            "thinking": "",
            "suggested_questions": "not a list",
            "debug": {"context_used": false}
        }"#;
        assert!(parse(raw).is_err());
    }

    #[test]
    fn parsing_is_idempotent() {
        let raw = r#"{
            "response": "Welcome reception starts at 18:00.",
            "thinking": "schedule lookup",
            "suggested_questions": ["Where is the venue?"],
            "debug": {"context_used": true}
        }"#;
        assert_eq!(parse(raw).unwrap(), parse(raw).unwrap());
    }

    #[test]
    fn placeholder_round_trips() {
        let placeholder = ResponseEnvelope::pending();
        let decoded = parse(&placeholder.to_raw_payload()).unwrap();
        assert_eq!(decoded, placeholder);
    }
}
