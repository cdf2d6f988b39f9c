//! LightRAG MCP gateway.
//!
//! Translates Model Context Protocol resource reads and tool
//! invocations into HTTP calls against an externally hosted LightRAG
//! API server, and optionally supervises that server as a subprocess.
//! All retrieval, storage, and graph construction happens in the
//! external service; this crate is the protocol-to-HTTP seam.
//!
//! # Layout
//!
//! - [`api`] — typed HTTP client for the LightRAG server contract
//! - [`config`] — environment-sourced gateway configuration
//! - [`supervisor`] — optional `lightrag-server` subprocess lifecycle
//! - [`gateway`] — startup/shutdown wiring (initializing → ready → stopped)
//! - [`mcp`] — MCP tools, resources, and transports

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod mcp;
pub mod supervisor;

pub use api::{LightRagClient, QueryMode};
pub use config::GatewayConfig;
pub use error::{ClientError, GatewayError};
pub use gateway::Gateway;
pub use mcp::LightRagMcpServer;
