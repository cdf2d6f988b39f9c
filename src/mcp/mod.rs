//! MCP (Model Context Protocol) surface of the gateway.
//!
//! Binds a fixed catalog of addressable resources and invocable tools to
//! the LightRAG API client, routing each invocation to exactly one
//! client operation.
//!
//! # Architecture
//!
//! ```text
//! MCP client (agent)
//!   ↓ tool call / resource read (stdio or streamable HTTP)
//! LightRagMcpServer
//!   ↓ one HTTP request per invocation
//! LightRAG API server (external; optionally autostarted)
//! ```

pub mod params;
pub mod server;
pub mod transport;

pub use params::{
    DeleteDocumentParams, EntityParams, ExportGraphParams, InsertDocumentParams,
    QueryDocumentParams, RelationParams, UploadDocumentParams, VisualizeGraphParams,
};
pub use server::LightRagMcpServer;
pub use transport::{serve_sse, serve_stdio};
