//! MCP server implementation for the LightRAG gateway.
//!
//! Exposes the LightRAG API as MCP tools (actions) and resources
//! (reads). Every operation validates its parameters, delegates to
//! exactly one [`LightRagClient`] call, and surfaces client failures
//! with their status and message intact.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    AnnotateAble, CallToolResult, Content, Implementation, ListResourceTemplatesResult,
    ListResourcesResult, PaginatedRequestParams, ProtocolVersion, RawResource, RawResourceTemplate,
    ReadResourceRequestParams, ReadResourceResult, Resource, ResourceContents, ServerCapabilities,
    ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler, tool, tool_handler, tool_router};
use serde_json::Value;
use tracing::debug;

use crate::api::{LightRagClient, QueryRequest, types::DEFAULT_TOP_K};
use crate::config::GatewayConfig;
use crate::error::ClientError;
use crate::gateway::Gateway;

use super::params::{
    DEFAULT_PAGE_SIZE, DeleteDocumentParams, EntityParams, ExportGraphParams,
    InsertDocumentParams, MAX_GRAPH_NODES, QueryDocumentParams, RelationParams,
    UploadDocumentParams, VisualizeGraphParams,
};

/// Maps a client failure onto an MCP error, preserving kind and message.
///
/// Validation failures become `invalid_params` (they never reached the
/// network); transport and remote-service failures become internal
/// errors carrying the original diagnostics.
fn to_mcp_error(operation: &str, err: ClientError) -> McpError {
    match err {
        ClientError::Validation(msg) => McpError::invalid_params(msg, None),
        other => McpError::internal_error(format!("{operation} failed: {other}"), None),
    }
}

/// Serializes a JSON value into a successful tool result.
fn json_result(value: &Value) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Reads a `u32` value out of a `key=value&...` query string.
fn query_u32(query: Option<&str>, key: &str, default: u32) -> u32 {
    query
        .and_then(|q| {
            q.split('&').find_map(|pair| {
                let (k, v) = pair.split_once('=')?;
                (k == key).then(|| v.parse().ok()).flatten()
            })
        })
        .unwrap_or(default)
}

/// LightRAG MCP server.
///
/// Stateless per call: the only shared state is the immutable
/// configuration and the pooled HTTP client.
#[derive(Clone)]
pub struct LightRagMcpServer {
    tool_router: ToolRouter<Self>,
    client: Arc<LightRagClient>,
    config: Arc<GatewayConfig>,
}

#[tool_router]
impl LightRagMcpServer {
    /// Run a retrieval-augmented query against the indexed documents.
    #[tool(
        name = "query_document",
        description = "Query indexed documents through the LightRAG API. Supports the search modes local, global, hybrid, naive and mix; returns the generated answer (or only the retrieved context when only_need_context is set)."
    )]
    async fn query_document(
        &self,
        Parameters(params): Parameters<QueryDocumentParams>,
    ) -> Result<CallToolResult, McpError> {
        let request = QueryRequest {
            query: params.query,
            mode: params.mode,
            top_k: params.top_k.unwrap_or(DEFAULT_TOP_K),
            only_need_context: params.only_need_context,
            system_prompt: params.system_prompt,
            stream: params.stream,
        };
        let result = self
            .client
            .query(&request)
            .await
            .map_err(|e| to_mcp_error("query_document", e))?;
        json_result(&result)
    }

    /// Insert one or more text documents.
    #[tool(
        name = "insert_document",
        description = "Insert a text document (or an ordered list of documents) into LightRAG for indexing. Optional ids must match the number of texts."
    )]
    async fn insert_document(
        &self,
        Parameters(params): Parameters<InsertDocumentParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .client
            .insert_text(
                &params.text,
                params.ids.as_deref(),
                params.description.as_deref(),
            )
            .await
            .map_err(|e| to_mcp_error("insert_document", e))?;

        let count = result
            .get("count")
            .and_then(Value::as_u64)
            .unwrap_or(params.text.len() as u64);
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {e}"), None))?;
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Documents accepted for indexing (count: {count})\n{json}"
        ))]))
    }

    /// Upload a file from the local filesystem.
    #[tool(
        name = "upload_document",
        description = "Upload a local file to LightRAG for parsing and indexing."
    )]
    async fn upload_document(
        &self,
        Parameters(params): Parameters<UploadDocumentParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .client
            .upload_file(
                std::path::Path::new(&params.file_path),
                params.description.as_deref(),
            )
            .await
            .map_err(|e| to_mcp_error("upload_document", e))?;
        json_result(&result)
    }

    /// Delete a document by id.
    #[tool(
        name = "delete_document",
        description = "Delete a document from LightRAG by its id."
    )]
    async fn delete_document(
        &self,
        Parameters(params): Parameters<DeleteDocumentParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .client
            .delete_document(&params.doc_id)
            .await
            .map_err(|e| to_mcp_error("delete_document", e))?;
        json_result(&result)
    }

    /// Scan the configured input directory for new documents.
    #[tool(
        name = "scan_for_new_documents",
        description = "Trigger a scan of the LightRAG input directory for new documents to index."
    )]
    async fn scan_for_new_documents(&self) -> Result<CallToolResult, McpError> {
        let result = self
            .client
            .scan_documents()
            .await
            .map_err(|e| to_mcp_error("scan_for_new_documents", e))?;
        json_result(&result)
    }

    /// Create a knowledge-graph entity.
    #[tool(
        name = "create_entity",
        description = "Create an entity in the LightRAG knowledge graph with the given name and properties."
    )]
    async fn create_entity(
        &self,
        Parameters(params): Parameters<EntityParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .client
            .create_entity(&params.name, &params.properties)
            .await
            .map_err(|e| to_mcp_error("create_entity", e))?;
        json_result(&result)
    }

    /// Edit a knowledge-graph entity.
    #[tool(
        name = "edit_entity",
        description = "Update properties of an existing entity in the LightRAG knowledge graph."
    )]
    async fn edit_entity(
        &self,
        Parameters(params): Parameters<EntityParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .client
            .edit_entity(&params.name, &params.properties)
            .await
            .map_err(|e| to_mcp_error("edit_entity", e))?;
        json_result(&result)
    }

    /// Create a relation between two entities.
    #[tool(
        name = "create_relation",
        description = "Create a relation between two entities in the LightRAG knowledge graph."
    )]
    async fn create_relation(
        &self,
        Parameters(params): Parameters<RelationParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .client
            .create_relation(&params.source, &params.target, &params.properties)
            .await
            .map_err(|e| to_mcp_error("create_relation", e))?;
        json_result(&result)
    }

    /// Edit a relation between two entities.
    #[tool(
        name = "edit_relation",
        description = "Update properties of an existing relation in the LightRAG knowledge graph."
    )]
    async fn edit_relation(
        &self,
        Parameters(params): Parameters<RelationParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .client
            .edit_relation(&params.source, &params.target, &params.properties)
            .await
            .map_err(|e| to_mcp_error("edit_relation", e))?;
        json_result(&result)
    }

    /// Export the knowledge graph.
    #[tool(
        name = "export_graph",
        description = "Export the LightRAG knowledge graph in json, graphml, csv or txt format."
    )]
    async fn export_graph(
        &self,
        Parameters(params): Parameters<ExportGraphParams>,
    ) -> Result<CallToolResult, McpError> {
        let body = self
            .client
            .export_graph(params.format)
            .await
            .map_err(|e| to_mcp_error("export_graph", e))?;
        Ok(CallToolResult::success(vec![Content::text(body)]))
    }

    /// Fetch a knowledge-graph neighborhood for visualization.
    #[tool(
        name = "visualize_graph",
        description = "Fetch a knowledge-graph neighborhood as nodes and edges, optionally centered on an entity label, with bounded traversal depth and node count."
    )]
    async fn visualize_graph(
        &self,
        Parameters(params): Parameters<VisualizeGraphParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .client
            .knowledge_graph(params.label.as_deref(), params.depth(), params.nodes())
            .await
            .map_err(|e| to_mcp_error("visualize_graph", e))?;
        json_result(&result)
    }

    /// Probe the LightRAG API health.
    #[tool(
        name = "check_lightrag_health",
        description = "Check the LightRAG API health. Never fails: an unreachable service is reported as a degraded status."
    )]
    async fn check_lightrag_health(&self) -> Result<CallToolResult, McpError> {
        let health = self.client.check_health().await;
        let json = serde_json::to_string_pretty(&health)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {e}"), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

impl LightRagMcpServer {
    /// Creates a server from an explicit client and configuration.
    #[must_use]
    pub fn new(client: Arc<LightRagClient>, config: Arc<GatewayConfig>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            client,
            config,
        }
    }

    /// Creates a server sharing a started gateway's client and config.
    #[must_use]
    pub fn from_gateway(gateway: &Gateway) -> Self {
        Self::new(gateway.client(), gateway.config())
    }

    /// The gateway configuration backing this server.
    #[must_use]
    pub fn config(&self) -> Arc<GatewayConfig> {
        Arc::clone(&self.config)
    }

    /// Resolves a `lightrag://` resource URI to its content.
    ///
    /// Each URI maps to exactly one client operation; pagination is
    /// carried in the query string.
    async fn read_uri(&self, uri: &str) -> Result<String, McpError> {
        let path = uri.strip_prefix("lightrag://").ok_or_else(|| {
            McpError::invalid_params(format!("Invalid URI scheme, expected lightrag://: {uri}"), None)
        })?;
        let (path, query) = match path.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (path, None),
        };
        let parts: Vec<&str> = path.trim_end_matches('/').split('/').collect();
        debug!(%uri, "reading resource");

        let value = match parts.as_slice() {
            ["documents"] => {
                let page = query_u32(query, "page", 1);
                let page_size = query_u32(query, "page_size", DEFAULT_PAGE_SIZE);
                self.client
                    .list_documents(page, page_size)
                    .await
                    .map_err(|e| to_mcp_error("documents resource", e))?
            }
            ["document", doc_id] => self
                .client
                .get_document(doc_id)
                .await
                .map_err(|e| to_mcp_error("document resource", e))?,
            ["entities"] => self
                .client
                .graph_labels()
                .await
                .map_err(|e| to_mcp_error("entities resource", e))?,
            ["entity", name] => self
                .client
                .knowledge_graph(Some(name), 1, MAX_GRAPH_NODES)
                .await
                .map_err(|e| to_mcp_error("entity resource", e))?,
            ["relation", source, target] => {
                let graph = self
                    .client
                    .knowledge_graph(Some(source), 1, MAX_GRAPH_NODES)
                    .await
                    .map_err(|e| to_mcp_error("relation resource", e))?;
                let edges: Vec<Value> = graph
                    .get("edges")
                    .and_then(Value::as_array)
                    .map(|edges| {
                        edges
                            .iter()
                            .filter(|e| {
                                e.get("source").and_then(Value::as_str) == Some(*target)
                                    || e.get("target").and_then(Value::as_str) == Some(*target)
                            })
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();
                serde_json::json!({ "source": source, "target": target, "edges": edges })
            }
            ["status"] => self
                .client
                .pipeline_status()
                .await
                .map_err(|e| to_mcp_error("status resource", e))?,
            ["health"] => {
                let health = self.client.check_health().await;
                serde_json::to_value(health)
                    .map_err(|e| McpError::internal_error(format!("Serialization error: {e}"), None))?
            }
            ["webui"] => return Ok(self.config.webui_url()),
            _ => {
                return Err(McpError::resource_not_found(
                    format!("Unknown resource URI: {uri}"),
                    None,
                ));
            }
        };

        serde_json::to_string_pretty(&value)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {e}"), None))
    }
}

#[tool_handler]
impl ServerHandler for LightRagMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: "lightrag-mcp".to_string(),
                title: Some("LightRAG MCP Gateway".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Gateway to a LightRAG API server. Use the query_document tool for \
                 retrieval-augmented answers, insert_document/upload_document to add \
                 content, and the graph tools to inspect or edit the knowledge graph. \
                 Browse documents, entities and pipeline status via lightrag:// resources."
                    .to_string(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let catalog: &[(&str, &str, &str, &str)] = &[
            (
                "lightrag://documents",
                "Documents",
                "Paginated list of indexed documents (?page=&page_size=)",
                "application/json",
            ),
            (
                "lightrag://entities",
                "Entity labels",
                "Labels known to the knowledge graph",
                "application/json",
            ),
            (
                "lightrag://status",
                "Pipeline status",
                "Document indexing pipeline status and processing statistics",
                "application/json",
            ),
            (
                "lightrag://health",
                "Health snapshot",
                "LightRAG health, configuration and storage snapshot",
                "application/json",
            ),
            (
                "lightrag://webui",
                "Web UI",
                "URL of the LightRAG web interface",
                "text/plain",
            ),
        ];

        let resources: Vec<Resource> = catalog
            .iter()
            .map(|(uri, name, description, mime)| {
                let mut raw = RawResource::new(*uri, (*name).to_string());
                raw.description = Some((*description).to_string());
                raw.mime_type = Some((*mime).to_string());
                raw.no_annotation()
            })
            .collect();

        Ok(ListResourcesResult {
            resources,
            next_cursor: None,
            meta: None,
        })
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParams { uri, .. }: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let content = self.read_uri(&uri).await?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(content, uri)],
        })
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        let templates = [
            (
                "lightrag://document/{doc_id}",
                "Document by id",
                "Status record of a single indexed document.",
            ),
            (
                "lightrag://entity/{name}",
                "Entity by name",
                "Depth-1 knowledge-graph neighborhood of the named entity.",
            ),
            (
                "lightrag://relation/{source}/{target}",
                "Relation by endpoints",
                "Edges between the source and target entities.",
            ),
        ];

        let resource_templates = templates
            .into_iter()
            .map(|(uri_template, name, description)| {
                RawResourceTemplate {
                    uri_template: uri_template.to_string(),
                    name: name.to_string(),
                    title: None,
                    description: Some(description.to_string()),
                    mime_type: Some("application/json".to_string()),
                    icons: None,
                }
                .no_annotation()
            })
            .collect();

        Ok(ListResourceTemplatesResult {
            resource_templates,
            next_cursor: None,
            meta: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{QueryMode, TextInput};
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_server(server: &MockServer) -> LightRagMcpServer {
        let config = GatewayConfig::builder()
            .api_host("127.0.0.1")
            .api_port(server.port())
            .build();
        let client = Arc::new(LightRagClient::new(&config).unwrap());
        LightRagMcpServer::new(client, Arc::new(config))
    }

    fn offline_server() -> LightRagMcpServer {
        let config = GatewayConfig::builder()
            .api_host("127.0.0.1")
            .api_port(1)
            .build();
        let client = Arc::new(LightRagClient::new(&config).unwrap());
        LightRagMcpServer::new(client, Arc::new(config))
    }

    fn first_text(result: &CallToolResult) -> String {
        result
            .content
            .first()
            .and_then(|c| c.as_text())
            .map(|t| t.text.clone())
            .unwrap()
    }

    #[tokio::test]
    async fn insert_document_confirmation_contains_count() {
        let server = MockServer::start_async().await;
        let insert_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/documents/text")
                .json_body(json!({ "text": ["doc one", "doc two"] }));
            then.status(200).json_body(json!({ "status": "ok", "count": 2 }));
        });

        let mcp = test_server(&server);
        let result = mcp
            .insert_document(Parameters(InsertDocumentParams {
                text: TextInput::Many(vec!["doc one".into(), "doc two".into()]),
                ids: None,
                description: None,
            }))
            .await
            .unwrap();

        assert!(first_text(&result).contains("count: 2"));
        insert_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn insert_document_mismatched_ids_fails_without_network() {
        let server = MockServer::start_async().await;
        let any_mock = server.mock(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({}));
        });

        let mcp = test_server(&server);
        let err = mcp
            .insert_document(Parameters(InsertDocumentParams {
                text: TextInput::Many(vec!["doc one".into(), "doc two".into()]),
                ids: Some(vec!["only-one".into()]),
                description: None,
            }))
            .await
            .unwrap_err();

        assert!(err.message.contains("ids length"));
        any_mock.assert_calls(0);
    }

    #[tokio::test]
    async fn query_document_surfaces_remote_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/query");
            then.status(500).body(r#"{"error":"boom"}"#);
        });

        let mcp = test_server(&server);
        let err = mcp
            .query_document(Parameters(QueryDocumentParams {
                query: "q".into(),
                mode: QueryMode::Hybrid,
                top_k: None,
                only_need_context: false,
                system_prompt: None,
                stream: None,
            }))
            .await
            .unwrap_err();

        assert!(err.message.contains("500"));
        assert!(err.message.contains("boom"));
    }

    #[tokio::test]
    async fn query_document_returns_response_verbatim() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/query").json_body(json!({
                "query": "what is lightrag",
                "mode": "local",
                "top_k": 10,
                "only_need_context": false
            }));
            then.status(200)
                .json_body(json!({ "response": "a graph-based RAG system" }));
        });

        let mcp = test_server(&server);
        let result = mcp
            .query_document(Parameters(QueryDocumentParams {
                query: "what is lightrag".into(),
                mode: QueryMode::Local,
                top_k: None,
                only_need_context: false,
                system_prompt: None,
                stream: None,
            }))
            .await
            .unwrap();

        assert!(first_text(&result).contains("a graph-based RAG system"));
    }

    #[tokio::test]
    async fn visualize_graph_applies_defaults() {
        let server = MockServer::start_async().await;
        let graph_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/graphs")
                .query_param("max_depth", "3")
                .query_param("max_nodes", "100")
                .query_param("label", "Rust");
            then.status(200).json_body(json!({ "nodes": [], "edges": [] }));
        });

        let mcp = test_server(&server);
        mcp.visualize_graph(Parameters(VisualizeGraphParams {
            label: Some("Rust".into()),
            max_depth: None,
            max_nodes: None,
        }))
        .await
        .unwrap();

        graph_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn health_tool_succeeds_against_unreachable_service() {
        let mcp = offline_server();
        let result = mcp.check_lightrag_health().await.unwrap();
        assert!(first_text(&result).contains("error"));
    }

    #[tokio::test]
    async fn read_document_resource() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/documents/doc-1");
            then.status(200)
                .json_body(json!({ "id": "doc-1", "status": "processed" }));
        });

        let mcp = test_server(&server);
        let content = mcp.read_uri("lightrag://document/doc-1").await.unwrap();
        assert!(content.contains("processed"));
    }

    #[tokio::test]
    async fn read_documents_resource_forwards_pagination() {
        let server = MockServer::start_async().await;
        let list_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/documents/paginated")
                .json_body(json!({ "page": 2, "page_size": 10 }));
            then.status(200).json_body(json!({ "documents": [] }));
        });

        let mcp = test_server(&server);
        mcp.read_uri("lightrag://documents?page=2&page_size=10")
            .await
            .unwrap();
        list_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn read_relation_resource_filters_edges() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/graphs").query_param("label", "A");
            then.status(200).json_body(json!({
                "nodes": [],
                "edges": [
                    { "source": "A", "target": "B", "keywords": "uses" },
                    { "source": "A", "target": "C", "keywords": "other" }
                ]
            }));
        });

        let mcp = test_server(&server);
        let content = mcp.read_uri("lightrag://relation/A/B").await.unwrap();
        let value: Value = serde_json::from_str(&content).unwrap();
        let edges = value["edges"].as_array().unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0]["target"], "B");
    }

    #[tokio::test]
    async fn read_webui_resource_needs_no_network() {
        let mcp = offline_server();
        let content = mcp.read_uri("lightrag://webui").await.unwrap();
        assert_eq!(content, "http://127.0.0.1:1/webui");
    }

    #[tokio::test]
    async fn read_rejects_foreign_scheme() {
        let mcp = offline_server();
        let err = mcp.read_uri("file:///etc/passwd").await.unwrap_err();
        assert!(err.message.contains("lightrag://"));
    }

    #[tokio::test]
    async fn read_rejects_unknown_path() {
        let mcp = offline_server();
        let err = mcp.read_uri("lightrag://nope/nothing/here").await.unwrap_err();
        assert!(err.message.contains("Unknown resource"));
    }
}
