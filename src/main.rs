//! Entry point for the LightRAG MCP gateway.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use lightrag_mcp::cli::{Cli, Command};
use lightrag_mcp::mcp::{serve_sse, serve_stdio};
use lightrag_mcp::{Gateway, LightRagMcpServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the MCP stdio protocol; logs go to stderr.
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.gateway_config();
    let bind_host = config.bind_host.clone();
    let bind_port = config.bind_port;

    let gateway = Gateway::start(config).await?;
    let server = LightRagMcpServer::from_gateway(&gateway);

    let result = match cli.command {
        Command::Stdio => serve_stdio(server).await,
        Command::Sse { host, port } => {
            let host = host.unwrap_or(bind_host);
            let port = port.unwrap_or(bind_port);
            serve_sse(server, &host, port).await
        }
    };

    gateway.shutdown().await;
    result
}
