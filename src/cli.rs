//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros. Connection
//! settings resolve in order: CLI flags → environment variables →
//! defaults.

use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::GatewayConfig;

/// LightRAG MCP gateway.
///
/// Exposes a LightRAG API server as Model Context Protocol tools and
/// resources over stdio or streamable HTTP.
#[derive(Parser, Debug)]
#[command(name = "lightrag-mcp")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// LightRAG API host.
    #[arg(long)]
    pub api_host: Option<String>,

    /// LightRAG API port.
    #[arg(long)]
    pub api_port: Option<u16>,

    /// LightRAG API key, sent as X-API-Key.
    #[arg(long, env = "LIGHTRAG_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Spawn and supervise lightrag-server as a subprocess.
    #[arg(long)]
    pub autostart: bool,

    /// Per-call HTTP timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Enable verbose (debug-level) logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The transport to serve.
    #[command(subcommand)]
    pub command: Command,
}

/// Available transports.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve MCP over stdio.
    ///
    /// Reads JSON-RPC messages from stdin, writes responses to stdout.
    #[command(after_help = r#"Examples:
  lightrag-mcp stdio                                  # External lightrag-server
  LIGHTRAG_AUTOSTART=true lightrag-mcp stdio          # Supervise the server too
  lightrag-mcp --api-host rag.internal --api-port 9621 stdio
"#)]
    Stdio,

    /// Serve MCP over streamable HTTP.
    #[command(after_help = r#"Examples:
  lightrag-mcp sse                                    # Listen on 127.0.0.1:8000
  lightrag-mcp sse --host 0.0.0.0 --port 8080
"#)]
    Sse {
        /// Host to bind to (defaults to the HOST env var or 127.0.0.1).
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to the PORT env var or 8000).
        #[arg(long)]
        port: Option<u16>,
    },
}

impl Cli {
    /// Resolves the gateway configuration from CLI overrides, the
    /// environment, and defaults.
    #[must_use]
    pub fn gateway_config(&self) -> GatewayConfig {
        let mut builder = GatewayConfig::builder();
        if let Some(host) = &self.api_host {
            builder = builder.api_host(host);
        }
        if let Some(port) = self.api_port {
            builder = builder.api_port(port);
        }
        if let Some(key) = &self.api_key {
            builder = builder.api_key(key);
        }
        if self.autostart {
            builder = builder.autostart(true);
        }
        if let Some(secs) = self.timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder.from_env().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "lightrag-mcp",
            "--api-host",
            "rag.internal",
            "--api-port",
            "9000",
            "--timeout",
            "30",
            "--autostart",
            "stdio",
        ]);
        let config = cli.gateway_config();
        assert_eq!(config.api_host, "rag.internal");
        assert_eq!(config.api_port, 9000);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.autostart);
    }

    #[test]
    fn sse_accepts_bind_overrides() {
        let cli = Cli::parse_from(["lightrag-mcp", "sse", "--host", "0.0.0.0", "--port", "8080"]);
        match cli.command {
            Command::Sse { host, port } => {
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(8080));
            }
            Command::Stdio => panic!("expected sse"),
        }
    }
}
