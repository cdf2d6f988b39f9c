//! Error types for the LightRAG MCP gateway.
//!
//! Three failure kinds cross the client boundary: local parameter
//! validation, transport-level failures reaching the LightRAG API, and
//! non-success responses from a reachable API. None are retried here;
//! each surfaces to the MCP caller with its kind and message intact.

use thiserror::Error;

/// Errors produced by the [`LightRagClient`](crate::api::LightRagClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// Malformed or missing local parameters. Raised before any network
    /// request is issued.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Network-level failure reaching the LightRAG API: connection
    /// refused, DNS, timeout, or an undecodable response body.
    #[error("LightRAG API transport failure: {source}")]
    Transport {
        /// The underlying reqwest error.
        #[from]
        source: reqwest::Error,
    },

    /// The LightRAG API was reachable but returned a non-success status.
    #[error("LightRAG API returned {status}: {body}")]
    RemoteService {
        /// HTTP status code of the response.
        status: u16,
        /// Response body, preserved for diagnosis.
        body: String,
    },
}

impl ClientError {
    /// Returns true if this error never touched the network.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Errors raised during gateway startup and shutdown.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Spawning the `lightrag-server` subprocess failed. Fatal to
    /// startup: a misconfigured autostart cannot be silently ignored.
    #[error("failed to spawn lightrag-server: {0}")]
    Spawn(#[source] std::io::Error),

    /// Constructing the API client failed.
    #[error(transparent)]
    Client(#[from] ClientError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_message() {
        let err = ClientError::Validation("ids length 1 does not match 2 texts".to_string());
        assert!(err.is_validation());
        assert!(err.to_string().contains("invalid request"));
    }

    #[test]
    fn remote_service_error_preserves_status_and_body() {
        let err = ClientError::RemoteService {
            status: 500,
            body: r#"{"error":"boom"}"#.to_string(),
        };
        assert!(!err.is_validation());
        let msg = err.to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains("boom"));
    }
}
