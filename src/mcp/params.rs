//! MCP tool parameter types.
//!
//! Each tool's parameters are an explicit, validated structure with
//! named optional fields and documented defaults, using `schemars` for
//! the JSON Schema generation the MCP protocol requires.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::{GraphFormat, QueryMode, TextInput};

/// Default traversal depth for graph visualization.
pub const DEFAULT_GRAPH_DEPTH: u32 = 3;
/// Default node cap for graph visualization.
pub const DEFAULT_GRAPH_NODES: u32 = 100;
/// Hard cap on nodes returned by graph visualization.
pub const MAX_GRAPH_NODES: u32 = 1000;
/// Default page size for paginated document listings.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Parameters for the `query_document` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryDocumentParams {
    /// The query text.
    pub query: String,

    /// Search mode: `local`, `global`, `hybrid`, `naive`, or `mix`
    /// (default).
    #[serde(default)]
    pub mode: QueryMode,

    /// Maximum number of results (default 10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    /// Return only the retrieved context without generating an answer.
    #[serde(default)]
    pub only_need_context: bool,

    /// Optional system prompt for the answering LLM.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Streaming flag, passed through to the LightRAG API verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// Parameters for the `insert_document` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InsertDocumentParams {
    /// A document or an ordered list of documents to insert.
    pub text: TextInput,

    /// Optional ids, one per document. Length must match the number of
    /// texts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,

    /// Optional description attached to the inserted documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Parameters for the `upload_document` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UploadDocumentParams {
    /// Path to a local file to upload.
    pub file_path: String,

    /// Optional description attached to the uploaded file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Parameters for the `delete_document` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DeleteDocumentParams {
    /// Id of the document to delete.
    pub doc_id: String,
}

/// Parameters for the `create_entity` and `edit_entity` tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EntityParams {
    /// Entity name. Must be non-empty.
    pub name: String,

    /// Entity properties, forwarded verbatim to the graph endpoint.
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Parameters for the `create_relation` and `edit_relation` tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RelationParams {
    /// Source entity name. Must be non-empty.
    pub source: String,

    /// Target entity name. Must be non-empty.
    pub target: String,

    /// Relation properties, forwarded verbatim to the graph endpoint.
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Parameters for the `export_graph` tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ExportGraphParams {
    /// Export format: `json` (default), `graphml`, `csv`, or `txt`.
    #[serde(default)]
    pub format: GraphFormat,
}

/// Parameters for the `visualize_graph` tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct VisualizeGraphParams {
    /// Center entity label. When absent the whole graph view is
    /// requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Traversal depth from the center entity (default 3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,

    /// Maximum nodes to return (default 100, capped at 1000).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_nodes: Option<u32>,
}

impl VisualizeGraphParams {
    /// Effective depth after applying the default.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.max_depth.unwrap_or(DEFAULT_GRAPH_DEPTH)
    }

    /// Effective node cap after applying the default and hard cap.
    #[must_use]
    pub fn nodes(&self) -> u32 {
        self.max_nodes
            .unwrap_or(DEFAULT_GRAPH_NODES)
            .min(MAX_GRAPH_NODES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_apply_defaults() {
        let params: QueryDocumentParams =
            serde_json::from_value(serde_json::json!({ "query": "q" })).unwrap();
        assert_eq!(params.mode, QueryMode::Mix);
        assert!(params.top_k.is_none());
        assert!(!params.only_need_context);
    }

    #[test]
    fn insert_params_accept_string_or_list() {
        let single: InsertDocumentParams =
            serde_json::from_value(serde_json::json!({ "text": "one doc" })).unwrap();
        assert_eq!(single.text.len(), 1);

        let many: InsertDocumentParams =
            serde_json::from_value(serde_json::json!({ "text": ["a", "b", "c"] })).unwrap();
        assert_eq!(many.text.len(), 3);
    }

    #[test]
    fn visualize_params_cap_nodes() {
        let params = VisualizeGraphParams {
            label: None,
            max_depth: None,
            max_nodes: Some(10_000),
        };
        assert_eq!(params.depth(), DEFAULT_GRAPH_DEPTH);
        assert_eq!(params.nodes(), MAX_GRAPH_NODES);
    }

    #[test]
    fn entity_params_default_properties() {
        let params: EntityParams =
            serde_json::from_value(serde_json::json!({ "name": "Rust" })).unwrap();
        assert!(params.properties.is_empty());
    }
}
