//! MCP transport layer for stdio and streamable HTTP.
//!
//! Provides functions to start the MCP server with different transports.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use rmcp::ServiceExt;
use rmcp::transport::io::stdio;
use tracing::info;

use super::server::LightRagMcpServer;

/// Starts the MCP server with stdio transport.
///
/// The server reads JSON-RPC messages from stdin and writes responses to
/// stdout, so all logging goes to stderr. This is the standard transport
/// for editor and agent integration.
///
/// # Errors
///
/// Returns an error if the server fails to start or encounters a runtime error.
pub async fn serve_stdio(server: LightRagMcpServer) -> anyhow::Result<()> {
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}

/// Rejects requests whose `X-API-Key` header does not match the
/// configured inbound key.
async fn require_api_key(
    State(expected): State<Arc<String>>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok());
    if provided == Some(expected.as_str()) {
        next.run(request).await
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

/// Starts the MCP server with streamable HTTP transport.
///
/// Listens on the given host and port for incoming MCP connections at
/// `/mcp`. Named `serve_sse` for CLI familiarity; the underlying
/// transport is MCP's streamable HTTP (the successor to the legacy SSE
/// transport). When an inbound MCP API key is configured, requests must
/// carry it in the `X-API-Key` header.
///
/// # Errors
///
/// Returns an error if the server fails to bind or encounters a runtime error.
pub async fn serve_sse(server: LightRagMcpServer, host: &str, port: u16) -> anyhow::Result<()> {
    use rmcp::transport::streamable_http_server::{
        StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
    };

    let ct = tokio_util::sync::CancellationToken::new();

    let config = server.config();
    let factory_server = server.clone();
    let service = StreamableHttpService::new(
        move || Ok::<_, std::io::Error>(factory_server.clone()),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig {
            cancellation_token: ct.child_token(),
            ..Default::default()
        },
    );

    let mut router = axum::Router::new().nest_service("/mcp", service);
    if let Some(key) = &config.mcp_api_key {
        router = router.layer(axum::middleware::from_fn_with_state(
            Arc::new(key.clone()),
            require_api_key,
        ));
    }

    let addr = format!("{host}:{port}");
    let tcp_listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("LightRAG MCP gateway listening on http://{addr}/mcp");

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            ct.cancel();
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    /// Serves a dummy handler behind the key middleware on an ephemeral
    /// port and returns its URL.
    async fn spawn_guarded(key: &str) -> String {
        let router = axum::Router::new()
            .route("/mcp", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(
                Arc::new(key.to_string()),
                require_api_key,
            ));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/mcp")
    }

    #[tokio::test]
    async fn request_without_api_key_is_unauthorized() {
        let url = spawn_guarded("sekrit").await;
        let response = reqwest::get(&url).await.unwrap();
        assert_eq!(response.status().as_u16(), 401);
    }

    #[tokio::test]
    async fn request_with_wrong_api_key_is_unauthorized() {
        let url = spawn_guarded("sekrit").await;
        let response = reqwest::Client::new()
            .get(&url)
            .header("X-API-Key", "wrong")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 401);
    }

    #[tokio::test]
    async fn request_with_matching_api_key_passes_through() {
        let url = spawn_guarded("sekrit").await;
        let response = reqwest::Client::new()
            .get(&url)
            .header("X-API-Key", "sekrit")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(response.text().await.unwrap(), "ok");
    }
}
