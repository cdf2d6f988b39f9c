//! Gateway configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.
//! The resulting [`GatewayConfig`] is immutable for the process lifetime and
//! shared behind an `Arc`.

use std::time::Duration;

/// Default LightRAG API host.
const DEFAULT_API_HOST: &str = "localhost";
/// Default LightRAG API port.
const DEFAULT_API_PORT: u16 = 9621;
/// Default per-call timeout in seconds. LightRAG queries can run long
/// when the backing LLM is slow.
const DEFAULT_TIMEOUT_SECS: u64 = 150;
/// Default MCP bind host for the SSE transport.
const DEFAULT_BIND_HOST: &str = "127.0.0.1";
/// Default MCP bind port. Distinct from the LightRAG port to avoid clashes.
const DEFAULT_BIND_PORT: u16 = 8000;

/// Environment variables forwarded verbatim to a spawned
/// `lightrag-server` subprocess. The gateway never interprets these;
/// they select and authenticate the LLM and embedding backends of the
/// external service.
pub const FORWARDED_ENV_VARS: &[&str] = &[
    "LLM_BINDING",
    "LLM_MODEL",
    "LLM_BINDING_HOST",
    "LLM_BINDING_API_KEY",
    "EMBEDDING_BINDING",
    "EMBEDDING_MODEL",
    "EMBEDDING_BINDING_HOST",
    "EMBEDDING_BINDING_API_KEY",
    "WORKING_DIR",
    "INPUT_DIR",
];

/// Connection and lifecycle configuration for the gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// LightRAG API host.
    pub api_host: String,
    /// LightRAG API port.
    pub api_port: u16,
    /// API key sent to the LightRAG API as `X-API-Key`, if required.
    pub api_key: Option<String>,
    /// Spawn and supervise `lightrag-server` as a subprocess.
    pub autostart: bool,
    /// Per-call HTTP timeout. The health probe uses its own short,
    /// fixed timeout instead.
    pub timeout: Duration,
    /// Host the SSE transport binds to.
    pub bind_host: String,
    /// Port the SSE transport binds to.
    pub bind_port: u16,
    /// Inbound API key required on the SSE transport, if set.
    pub mcp_api_key: Option<String>,
}

impl GatewayConfig {
    /// Creates a new builder for `GatewayConfig`.
    #[must_use]
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::builder().from_env().build()
    }

    /// Base URL of the LightRAG API derived from host and port.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.api_host, self.api_port)
    }

    /// Fixed URL of the LightRAG web UI served by the external API.
    #[must_use]
    pub fn webui_url(&self) -> String {
        format!("{}/webui", self.base_url())
    }

    /// Environment variables to forward to a spawned subprocess,
    /// collected from the current process environment.
    #[must_use]
    pub fn forwarded_env(&self) -> Vec<(String, String)> {
        Self::forwarded_env_from(|name| std::env::var(name).ok())
    }

    /// Collects the allowlisted variables from an arbitrary source.
    fn forwarded_env_from(source: impl Fn(&str) -> Option<String>) -> Vec<(String, String)> {
        FORWARDED_ENV_VARS
            .iter()
            .filter_map(|name| source(name).map(|value| ((*name).to_string(), value)))
            .collect()
    }
}

/// Builder for [`GatewayConfig`].
#[derive(Debug, Clone, Default)]
pub struct GatewayConfigBuilder {
    api_host: Option<String>,
    api_port: Option<u16>,
    api_key: Option<String>,
    autostart: Option<bool>,
    timeout: Option<Duration>,
    bind_host: Option<String>,
    bind_port: Option<u16>,
    mcp_api_key: Option<String>,
}

impl GatewayConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.api_host.is_none() {
            self.api_host = std::env::var("LIGHTRAG_API_HOST").ok();
        }
        if self.api_port.is_none() {
            self.api_port = std::env::var("LIGHTRAG_API_PORT")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var("LIGHTRAG_API_KEY").ok().filter(|k| !k.is_empty());
        }
        if self.autostart.is_none() {
            self.autostart = std::env::var("LIGHTRAG_AUTOSTART")
                .ok()
                .map(|v| v.eq_ignore_ascii_case("true"));
        }
        if self.timeout.is_none() {
            self.timeout = std::env::var("TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs);
        }
        if self.bind_host.is_none() {
            self.bind_host = std::env::var("HOST").ok();
        }
        if self.bind_port.is_none() {
            self.bind_port = std::env::var("PORT").ok().and_then(|v| v.parse().ok());
        }
        if self.mcp_api_key.is_none() {
            self.mcp_api_key = std::env::var("MCP_API_KEY").ok().filter(|k| !k.is_empty());
        }
        self
    }

    /// Sets the LightRAG API host.
    #[must_use]
    pub fn api_host(mut self, host: impl Into<String>) -> Self {
        self.api_host = Some(host.into());
        self
    }

    /// Sets the LightRAG API port.
    #[must_use]
    pub const fn api_port(mut self, port: u16) -> Self {
        self.api_port = Some(port);
        self
    }

    /// Sets the LightRAG API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Enables or disables subprocess autostart.
    #[must_use]
    pub const fn autostart(mut self, enabled: bool) -> Self {
        self.autostart = Some(enabled);
        self
    }

    /// Sets the per-call HTTP timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the SSE transport bind host.
    #[must_use]
    pub fn bind_host(mut self, host: impl Into<String>) -> Self {
        self.bind_host = Some(host.into());
        self
    }

    /// Sets the SSE transport bind port.
    #[must_use]
    pub const fn bind_port(mut self, port: u16) -> Self {
        self.bind_port = Some(port);
        self
    }

    /// Sets the inbound MCP API key.
    #[must_use]
    pub fn mcp_api_key(mut self, key: impl Into<String>) -> Self {
        self.mcp_api_key = Some(key.into());
        self
    }

    /// Builds the [`GatewayConfig`], filling unset fields with defaults.
    #[must_use]
    pub fn build(self) -> GatewayConfig {
        GatewayConfig {
            api_host: self
                .api_host
                .unwrap_or_else(|| DEFAULT_API_HOST.to_string()),
            api_port: self.api_port.unwrap_or(DEFAULT_API_PORT),
            api_key: self.api_key,
            autostart: self.autostart.unwrap_or(false),
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            bind_host: self
                .bind_host
                .unwrap_or_else(|| DEFAULT_BIND_HOST.to_string()),
            bind_port: self.bind_port.unwrap_or(DEFAULT_BIND_PORT),
            mcp_api_key: self.mcp_api_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = GatewayConfig::builder().build();
        assert_eq!(config.api_host, DEFAULT_API_HOST);
        assert_eq!(config.api_port, DEFAULT_API_PORT);
        assert!(config.api_key.is_none());
        assert!(!config.autostart);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.base_url(), "http://localhost:9621");
    }

    #[test]
    fn forwarded_env_collects_only_allowlisted_vars() {
        let env = GatewayConfig::forwarded_env_from(|name| match name {
            "LLM_BINDING" => Some("openai".to_string()),
            "EMBEDDING_MODEL" => Some("bge-m3".to_string()),
            _ => None,
        });
        assert_eq!(env.len(), 2);
        assert!(env.contains(&("LLM_BINDING".to_string(), "openai".to_string())));
        assert!(env.contains(&("EMBEDDING_MODEL".to_string(), "bge-m3".to_string())));
    }

    #[test]
    fn forwarded_env_never_invents_variables() {
        let env = GatewayConfig::forwarded_env_from(|_| None);
        assert!(env.is_empty());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = GatewayConfig::builder()
            .api_host("rag.internal")
            .api_port(9000)
            .api_key("secret")
            .autostart(true)
            .timeout(Duration::from_secs(30))
            .bind_port(8088)
            .build();
        assert_eq!(config.base_url(), "http://rag.internal:9000");
        assert_eq!(config.webui_url(), "http://rag.internal:9000/webui");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert!(config.autostart);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.bind_port, 8088);
    }
}
