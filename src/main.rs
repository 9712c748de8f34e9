use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mcp_research_graph::{
    config::Config,
    server::{AppState, McpServer},
    storage::FileStore,
};

/// MCP server for a persistent quantitative-research knowledge graph
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Override the graph file location (GRAPH_FILE_PATH)
    #[arg(long, value_name = "PATH")]
    graph_file: Option<PathBuf>,

    /// Override the session file location (SESSION_FILE_PATH)
    #[arg(long, value_name = "PATH")]
    session_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(path) = cli.graph_file {
        config.storage.graph_path = path;
    }
    if let Some(path) = cli.session_file {
        config.storage.session_path = path;
    }

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "MCP Research Graph Server starting..."
    );

    let files = FileStore::new(&config.storage);
    info!(
        graph = %config.storage.graph_path.display(),
        sessions = %config.storage.session_path.display(),
        "Store paths resolved"
    );

    // Create application state
    let state = Arc::new(AppState::new(config, files));

    // Ensure the singleton status/priority entities exist
    if let Err(e) = state.status.initialize().await {
        error!(error = %e, "Failed to initialize status and priority entities");
        return Err(e.into());
    }

    // Start MCP server
    let server = McpServer::new(Arc::clone(&state));

    info!("Server ready, waiting for requests on stdin...");

    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        mcp_research_graph::config::LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        mcp_research_graph::config::LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
