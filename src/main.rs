use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::sync::Arc;

use langchain_docs_mcp::config::Settings;
use langchain_docs_mcp::server;
use langchain_docs_mcp::service::DocsService;

#[derive(Parser, Debug)]
#[command(version, about = "LangChain Documentation MCP and HTTP Server")]
struct Cli {
    /// Type of server to run
    #[arg(short, long, value_enum, default_value_t = ServerType::Stdio)]
    server_type: ServerType,

    /// Address for the SSE or HTTP server
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    address: String,

    #[command(flatten)]
    settings: Settings,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ServerType {
    /// Start a stdio MCP server
    Stdio,
    /// Start an SSE MCP server
    Sse,
    /// Start the HTTP query server
    Http,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    server::init_tracing(cli.server_type == ServerType::Stdio);
    let service = Arc::new(DocsService::new(cli.settings));

    match cli.server_type {
        ServerType::Sse => server::start_sse_server(&cli.address, service).await?,
        ServerType::Stdio => server::start_stdio_server(service).await?,
        ServerType::Http => server::start_http_server(&cli.address, service).await?,
    }

    Ok(())
}
