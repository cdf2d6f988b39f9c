//! HTTP client for the LightRAG API.
//!
//! Each operation issues exactly one outbound request and maps the
//! outcome onto [`ClientError`]: local validation failures never reach
//! the network, non-2xx responses become
//! [`ClientError::RemoteService`] with status and body preserved, and
//! network-level failures become [`ClientError::Transport`]. No retries,
//! no caching; the underlying reqwest pool is a transparent
//! optimization.

use std::path::Path;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::error::ClientError;

use super::types::{GraphFormat, HealthStatus, QueryRequest, TextInput};

/// Fixed timeout for the health probe, distinct from the general
/// per-call timeout. Health checks are diagnostics and must come back
/// fast or not at all.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the LightRAG server API.
#[derive(Debug, Clone)]
pub struct LightRagClient {
    http: reqwest::Client,
    base_url: String,
}

impl LightRagClient {
    /// Creates a client from gateway configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] if the configured API key is
    /// not a valid header value, or [`ClientError::Transport`] if the
    /// HTTP client cannot be constructed.
    pub fn new(config: &GatewayConfig) -> Result<Self, ClientError> {
        Self::with_base_url(&config.base_url(), config.api_key.as_deref(), config.timeout)
    }

    /// Creates a client for an explicit base URL. Used directly by tests
    /// against a stub server.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`LightRagClient::new`].
    pub fn with_base_url(
        base_url: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(key).map_err(|_| {
                ClientError::Validation("API key is not a valid header value".to_string())
            })?;
            headers.insert("X-API-Key", value);
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Checks a response status and decodes the JSON body.
    async fn decode(response: reqwest::Response) -> Result<Value, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::RemoteService {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    /// Like [`Self::decode`] but returns the raw body for flat-text
    /// export formats.
    async fn decode_text(response: reqwest::Response) -> Result<String, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::RemoteService {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.text().await?)
    }

    fn require_non_empty(value: &str, field: &str) -> Result<(), ClientError> {
        if value.trim().is_empty() {
            return Err(ClientError::Validation(format!("{field} must not be empty")));
        }
        Ok(())
    }

    /// Runs a query against the indexed documents. `POST /query`.
    pub async fn query(&self, request: &QueryRequest) -> Result<Value, ClientError> {
        Self::require_non_empty(&request.query, "query")?;
        let url = self.url("/query");
        debug!(%url, mode = %request.mode, top_k = request.top_k, "querying LightRAG");
        let response = self.http.post(&url).json(request).send().await?;
        Self::decode(response).await
    }

    /// Inserts one or more texts. `POST /documents/text`.
    ///
    /// Every text must be non-empty after trimming, and when `ids` is
    /// provided its length must match the number of texts; violations
    /// fail with [`ClientError::Validation`] before any network request
    /// is issued.
    pub async fn insert_text(
        &self,
        text: &TextInput,
        ids: Option<&[String]>,
        description: Option<&str>,
    ) -> Result<Value, ClientError> {
        if text.is_empty() {
            return Err(ClientError::Validation(
                "text must contain at least one non-empty document".to_string(),
            ));
        }
        if text.has_blank() {
            return Err(ClientError::Validation(
                "text contains a blank document".to_string(),
            ));
        }
        if let Some(ids) = ids
            && ids.len() != text.len()
        {
            return Err(ClientError::Validation(format!(
                "ids length {} does not match {} text(s)",
                ids.len(),
                text.len()
            )));
        }

        let mut payload = json!({ "text": text });
        if let Some(ids) = ids {
            payload["ids"] = json!(ids);
        }
        if let Some(description) = description {
            payload["description"] = json!(description);
        }

        let url = self.url("/documents/text");
        debug!(%url, count = text.len(), "inserting text into LightRAG");
        let response = self.http.post(&url).json(&payload).send().await?;
        Self::decode(response).await
    }

    /// Uploads a file from the local filesystem. `POST /documents/upload`.
    pub async fn upload_file(
        &self,
        file_path: &Path,
        description: Option<&str>,
    ) -> Result<Value, ClientError> {
        let bytes = tokio::fs::read(file_path).await.map_err(|e| {
            ClientError::Validation(format!("cannot read {}: {e}", file_path.display()))
        })?;
        let file_name = file_path
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());

        let mut form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name(file_name));
        if let Some(description) = description {
            form = form.text("description", description.to_string());
        }

        let url = self.url("/documents/upload");
        debug!(%url, path = %file_path.display(), "uploading file to LightRAG");
        let response = self.http.post(&url).multipart(form).send().await?;
        Self::decode(response).await
    }

    /// Deletes a document by id. `DELETE /documents/{id}`.
    pub async fn delete_document(&self, doc_id: &str) -> Result<Value, ClientError> {
        Self::require_non_empty(doc_id, "doc_id")?;
        let url = self.url(&format!("/documents/{doc_id}"));
        debug!(%url, "deleting document");
        let response = self.http.delete(&url).send().await?;
        Self::decode(response).await
    }

    /// Fetches a single document's status record. `GET /documents/{id}`.
    pub async fn get_document(&self, doc_id: &str) -> Result<Value, ClientError> {
        Self::require_non_empty(doc_id, "doc_id")?;
        let url = self.url(&format!("/documents/{doc_id}"));
        let response = self.http.get(&url).send().await?;
        Self::decode(response).await
    }

    /// Lists documents with pagination. `POST /documents/paginated`.
    pub async fn list_documents(&self, page: u32, page_size: u32) -> Result<Value, ClientError> {
        let url = self.url("/documents/paginated");
        let payload = json!({ "page": page, "page_size": page_size });
        let response = self.http.post(&url).json(&payload).send().await?;
        Self::decode(response).await
    }

    /// Triggers a scan of the configured input directory for new
    /// documents. `POST /documents/scan`.
    pub async fn scan_documents(&self) -> Result<Value, ClientError> {
        let url = self.url("/documents/scan");
        debug!(%url, "scanning for new documents");
        let response = self.http.post(&url).send().await?;
        Self::decode(response).await
    }

    /// Reports the indexing pipeline status. `GET /documents/pipeline_status`.
    pub async fn pipeline_status(&self) -> Result<Value, ClientError> {
        let url = self.url("/documents/pipeline_status");
        let response = self.http.get(&url).send().await?;
        Self::decode(response).await
    }

    /// Lists entity labels known to the knowledge graph. `GET /graph/label/list`.
    pub async fn graph_labels(&self) -> Result<Value, ClientError> {
        let url = self.url("/graph/label/list");
        let response = self.http.get(&url).send().await?;
        Self::decode(response).await
    }

    /// Fetches a knowledge-graph neighborhood for visualization.
    /// `GET /graphs`.
    pub async fn knowledge_graph(
        &self,
        label: Option<&str>,
        max_depth: u32,
        max_nodes: u32,
    ) -> Result<Value, ClientError> {
        let url = self.url("/graphs");
        let mut request = self.http.get(&url).query(&[
            ("max_depth", max_depth.to_string()),
            ("max_nodes", max_nodes.to_string()),
        ]);
        if let Some(label) = label {
            request = request.query(&[("label", label)]);
        }
        let response = request.send().await?;
        Self::decode(response).await
    }

    /// Exports the knowledge graph in the given format. `GET /graph/export`.
    pub async fn export_graph(&self, format: GraphFormat) -> Result<String, ClientError> {
        let url = self.url("/graph/export");
        debug!(%url, %format, "exporting graph");
        let response = self
            .http
            .get(&url)
            .query(&[("format", format.as_str())])
            .send()
            .await?;
        Self::decode_text(response).await
    }

    /// Creates a knowledge-graph entity. `POST /graph/entity/create`.
    pub async fn create_entity(
        &self,
        name: &str,
        properties: &serde_json::Map<String, Value>,
    ) -> Result<Value, ClientError> {
        Self::require_non_empty(name, "entity name")?;
        let url = self.url("/graph/entity/create");
        let payload = json!({ "entity_name": name, "data": properties });
        let response = self.http.post(&url).json(&payload).send().await?;
        Self::decode(response).await
    }

    /// Updates a knowledge-graph entity. `POST /graph/entity/edit`.
    pub async fn edit_entity(
        &self,
        name: &str,
        properties: &serde_json::Map<String, Value>,
    ) -> Result<Value, ClientError> {
        Self::require_non_empty(name, "entity name")?;
        let url = self.url("/graph/entity/edit");
        let payload = json!({ "entity_name": name, "updated_data": properties });
        let response = self.http.post(&url).json(&payload).send().await?;
        Self::decode(response).await
    }

    /// Creates a relation between two entities. `POST /graph/relation/create`.
    pub async fn create_relation(
        &self,
        source: &str,
        target: &str,
        properties: &serde_json::Map<String, Value>,
    ) -> Result<Value, ClientError> {
        Self::require_non_empty(source, "source entity")?;
        Self::require_non_empty(target, "target entity")?;
        let url = self.url("/graph/relation/create");
        let payload = json!({ "source_id": source, "target_id": target, "data": properties });
        let response = self.http.post(&url).json(&payload).send().await?;
        Self::decode(response).await
    }

    /// Updates a relation between two entities. `POST /graph/relation/edit`.
    pub async fn edit_relation(
        &self,
        source: &str,
        target: &str,
        properties: &serde_json::Map<String, Value>,
    ) -> Result<Value, ClientError> {
        Self::require_non_empty(source, "source entity")?;
        Self::require_non_empty(target, "target entity")?;
        let url = self.url("/graph/relation/edit");
        let payload =
            json!({ "source_id": source, "target_id": target, "updated_data": properties });
        let response = self.http.post(&url).json(&payload).send().await?;
        Self::decode(response).await
    }

    /// Probes the LightRAG API health. `GET /health`.
    ///
    /// By contract this never fails: transport errors and non-success
    /// statuses both collapse into a degraded [`HealthStatus`], since
    /// callers use this for non-fatal diagnostics.
    pub async fn check_health(&self) -> HealthStatus {
        let url = self.url("/health");
        let response = match self
            .http
            .get(&url)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(%url, error = %e, "LightRAG API unreachable");
                return HealthStatus::degraded(format!("LightRAG API unreachable: {e}"));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%url, %status, "LightRAG health check returned non-success");
            return HealthStatus::degraded(format!("health check returned {status}: {body}"));
        }

        match response.json::<HealthStatus>().await {
            Ok(health) => health,
            Err(e) => HealthStatus::degraded(format!("health response undecodable: {e}")),
        }
    }
}
