//! Request and response types for the LightRAG API.
//!
//! These mirror the external service's JSON contract. Fields the gateway
//! does not interpret are carried as raw [`serde_json::Value`] payloads.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default number of results for a query.
pub const DEFAULT_TOP_K: u32 = 10;

/// Search mode accepted by the LightRAG `/query` endpoint.
///
/// This is a closed enumeration; the gateway forwards the lowercase
/// string unchanged and rejects anything else at deserialization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// Entity-neighborhood retrieval.
    Local,
    /// Community/summary-level retrieval.
    Global,
    /// Combined local and global retrieval.
    Hybrid,
    /// Plain vector search without graph context.
    Naive,
    /// Mixed graph and vector retrieval (LightRAG default).
    #[default]
    Mix,
}

impl QueryMode {
    /// The wire string sent to the LightRAG API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Global => "global",
            Self::Hybrid => "hybrid",
            Self::Naive => "naive",
            Self::Mix => "mix",
        }
    }

    /// All supported modes.
    pub const ALL: [Self; 5] = [
        Self::Local,
        Self::Global,
        Self::Hybrid,
        Self::Naive,
        Self::Mix,
    ];
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Graph export format accepted by the LightRAG export endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum GraphFormat {
    /// Structured JSON export.
    #[default]
    Json,
    /// GraphML XML export.
    Graphml,
    /// Flat CSV edge list.
    Csv,
    /// Flat text edge list.
    Txt,
}

impl GraphFormat {
    /// The wire string sent as the `format` query parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Graphml => "graphml",
            Self::Csv => "csv",
            Self::Txt => "txt",
        }
    }
}

impl fmt::Display for GraphFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single text or an ordered sequence of texts for insertion.
///
/// The LightRAG `/documents/text` endpoint accepts both shapes under the
/// same `text` key, so this serializes untagged.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum TextInput {
    /// One document.
    Single(String),
    /// Several documents, inserted in order.
    Many(Vec<String>),
}

impl TextInput {
    /// Number of documents this input carries.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(texts) => texts.len(),
        }
    }

    /// Returns true when there is nothing to insert.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(text) => text.trim().is_empty(),
            Self::Many(texts) => {
                texts.is_empty() || texts.iter().all(|t| t.trim().is_empty())
            }
        }
    }

    /// Returns true when any carried document is empty after trimming.
    /// Blank documents are rejected before insertion.
    #[must_use]
    pub fn has_blank(&self) -> bool {
        match self {
            Self::Single(text) => text.trim().is_empty(),
            Self::Many(texts) => {
                texts.is_empty() || texts.iter().any(|t| t.trim().is_empty())
            }
        }
    }
}

/// Request body for the LightRAG `/query` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    /// Query text.
    pub query: String,
    /// Search mode, forwarded unchanged.
    pub mode: QueryMode,
    /// Maximum results to retrieve.
    pub top_k: u32,
    /// Return only the retrieved context without generating an answer.
    pub only_need_context: bool,
    /// Optional system prompt for the answering LLM.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Streaming flag, passed through verbatim. Stream handling itself
    /// belongs to the external service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl QueryRequest {
    /// Creates a request with default mode and limits.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            mode: QueryMode::default(),
            top_k: DEFAULT_TOP_K,
            only_need_context: false,
            system_prompt: None,
            stream: None,
        }
    }
}

/// Health snapshot of the LightRAG API.
///
/// By contract this type is also used for degraded states: the health
/// probe never fails, it reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Reported status, e.g. `"healthy"` or `"error"`.
    pub status: String,
    /// Diagnostic message for degraded states.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Remaining fields of the health payload (configuration snapshot,
    /// storage info) preserved verbatim.
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl HealthStatus {
    /// A degraded status carrying a diagnostic message.
    #[must_use]
    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
            details: serde_json::Map::new(),
        }
    }

    /// Whether the external service reported itself healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.as_str(), "healthy" | "ok")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(QueryMode::Local, "local")]
    #[test_case(QueryMode::Global, "global")]
    #[test_case(QueryMode::Hybrid, "hybrid")]
    #[test_case(QueryMode::Naive, "naive")]
    #[test_case(QueryMode::Mix, "mix")]
    fn query_mode_wire_string(mode: QueryMode, expected: &str) {
        assert_eq!(mode.as_str(), expected);
        let json = serde_json::to_string(&mode).unwrap();
        assert_eq!(json, format!("\"{expected}\""));
    }

    #[test]
    fn query_mode_rejects_unknown() {
        let result: Result<QueryMode, _> = serde_json::from_str("\"semantic\"");
        assert!(result.is_err());
    }

    #[test]
    fn text_input_serializes_both_shapes() {
        let single = serde_json::to_value(TextInput::Single("doc".into())).unwrap();
        assert_eq!(single, serde_json::json!("doc"));

        let many =
            serde_json::to_value(TextInput::Many(vec!["a".into(), "b".into()])).unwrap();
        assert_eq!(many, serde_json::json!(["a", "b"]));
    }

    #[test]
    fn text_input_len_and_empty() {
        assert_eq!(TextInput::Single("x".into()).len(), 1);
        assert_eq!(TextInput::Many(vec!["a".into(), "b".into()]).len(), 2);
        assert!(TextInput::Single(String::new()).is_empty());
        assert!(TextInput::Single("   ".into()).is_empty());
        assert!(TextInput::Many(vec![]).is_empty());
        assert!(!TextInput::Many(vec!["a".into()]).is_empty());
    }

    #[test]
    fn text_input_flags_blank_elements() {
        assert!(TextInput::Single("  ".into()).has_blank());
        assert!(TextInput::Many(vec![String::new(), "x".into()]).has_blank());
        assert!(TextInput::Many(vec!["\t".into()]).has_blank());
        assert!(!TextInput::Many(vec!["a".into(), "b".into()]).has_blank());
        assert!(!TextInput::Single("doc".into()).has_blank());
    }

    #[test]
    fn query_request_omits_unset_optionals() {
        let value = serde_json::to_value(QueryRequest::new("q")).unwrap();
        assert_eq!(value["mode"], "mix");
        assert_eq!(value["top_k"], DEFAULT_TOP_K);
        assert!(value.get("system_prompt").is_none());
        assert!(value.get("stream").is_none());
    }

    #[test]
    fn health_status_degraded() {
        let health = HealthStatus::degraded("connection refused");
        assert!(!health.is_healthy());
        assert_eq!(health.status, "error");
    }

    #[test]
    fn health_status_parses_extra_fields() {
        let health: HealthStatus = serde_json::from_value(serde_json::json!({
            "status": "healthy",
            "working_directory": "/data/rag",
            "configuration": {"llm_binding": "openai"}
        }))
        .unwrap();
        assert!(health.is_healthy());
        assert!(health.details.contains_key("configuration"));
    }
}
