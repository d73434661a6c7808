use clap::Parser as _;
use magic_patterns_mcp::config::{Cli, ServerConfig};
use magic_patterns_mcp::logging;
use magic_patterns_mcp::server::{DesignServer, serve_stdio};
use magic_patterns_tools::runtime::DesignClient;
use magic_patterns_tools::safety::redact_url;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_format)?;

    let config = ServerConfig::from_env(&cli).inspect_err(|e| {
        error!(error = %e, "refusing to start");
    })?;
    let client = DesignClient::new(&config.client, config.api_key)?;

    info!(
        endpoint = %redact_url(client.endpoint()),
        version = env!("CARGO_PKG_VERSION"),
        "starting Magic Patterns MCP server on stdio"
    );

    tokio::select! {
        result = serve_stdio(DesignServer::new(client)) => result?,
        _ = tokio::signal::ctrl_c() => info!("interrupted, shutting down"),
    }

    Ok(())
}
