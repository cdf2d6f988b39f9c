//! Client layer for the external LightRAG API.
//!
//! The gateway owns no retrieval, storage, or graph logic; everything in
//! this module is marshaling between typed local calls and the LightRAG
//! server's HTTP contract.

pub mod http;
pub mod types;

pub use http::LightRagClient;
pub use types::{GraphFormat, HealthStatus, QueryMode, QueryRequest, TextInput};
