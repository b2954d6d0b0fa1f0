use anyhow::Result;
use chainguard_mcp::server::tools;
use chainguard_mcp::{AdvisoryDb, McpServer, ServerConfig, UnconfiguredClient, UpstreamClient};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Chainguard MCP server - security advisory tools over stdio
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to the advisory database JSON file
    #[clap(long = "advisory-db", env = "CHAINGUARD_ADVISORY_DB")]
    advisory_db: Option<PathBuf>,

    /// Enable session memory (overrides CHAINGUARD_MEMORY_ENABLED)
    #[clap(long)]
    memory_enabled: bool,

    /// Enable verbose output
    #[clap(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries protocol frames only; all logging goes to stderr
    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = ServerConfig::from_env();
    if args.memory_enabled {
        config.memory_enabled = true;
    }
    if args.advisory_db.is_some() {
        config.advisory_db = args.advisory_db;
    }

    let upstream: Arc<dyn UpstreamClient> = match &config.advisory_db {
        Some(path) => Arc::new(AdvisoryDb::load(path)?),
        None => Arc::new(UnconfiguredClient),
    };

    // Duplicate registration is a startup bug; fail before the loop starts
    let registry = tools::default_registry()?;

    let server = McpServer::new(config, registry, upstream);
    server.serve_stdio().await?;

    Ok(())
}
