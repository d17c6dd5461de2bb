use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use video_search_mcp::config::{find_config_file, get_config, load_config};
use video_search_mcp::mcp::{McpClient, DEFAULT_MAX_RESULTS};
use video_search_mcp::models::SearchTool;

/// Video Search MCP - Search videos, channels and playlists through an MCP server
#[derive(Parser, Debug)]
#[command(name = "video-search-mcp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search videos, channels and playlists through an MCP server", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error log output
    #[arg(long, short)]
    quiet: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// MCP server base URL (overrides configuration)
    #[arg(long, global = true)]
    server_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search for content
    #[command(alias = "s")]
    Search {
        /// Search query
        query: String,

        /// Content type to search
        #[arg(long = "type", short = 't', value_enum, default_value_t = ContentKind::All)]
        kind: ContentKind,

        /// Maximum number of results
        #[arg(long, short = 'm', default_value_t = DEFAULT_MAX_RESULTS)]
        max_results: u32,
    },

    /// Probe the MCP server with tools/list
    Health,

    /// Check whether a session can be established
    Status,

    /// List the tools the MCP server advertises
    Tools,
}

/// Content type selector for the search command
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ContentKind {
    Videos,
    Channels,
    Playlists,
    All,
}

impl From<ContentKind> for SearchTool {
    fn from(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Videos => SearchTool::Videos,
            ContentKind::Channels => SearchTool::Channels,
            ContentKind::Playlists => SearchTool::Playlists,
            ContentKind::All => SearchTool::All,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("video_search_mcp={}", env_filter)),
        ))
        .with(
            cli.log_json
                .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
        )
        .with(
            (!cli.log_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
        .init();

    let mut config = if let Some(config_path) = &cli.config {
        load_config(config_path)?
    } else if let Some(config_path) = find_config_file() {
        tracing::info!("Using config file: {}", config_path.display());
        load_config(&config_path)?
    } else {
        get_config()?
    };
    if let Some(server_url) = cli.server_url {
        config.server_url = server_url;
    }

    tracing::debug!(endpoint = %config.endpoint_url(), "using MCP endpoint");
    let client = McpClient::new(config)?;

    match cli.command {
        Commands::Search {
            query,
            kind,
            max_results,
        } => {
            let outcome = client.search(kind.into(), &query, max_results).await;
            print_json(&outcome)?;
            if outcome.is_error() {
                std::process::exit(1);
            }
        }
        Commands::Health => {
            let report = client.health().await;
            print_json(&report)?;
            if !report.is_healthy() {
                std::process::exit(1);
            }
        }
        Commands::Status => {
            print_json(&client.status().await)?;
        }
        Commands::Tools => {
            let tools = client.list_tools().await?;
            print_json(&tools)?;
        }
    }

    Ok(())
}
