//! # Video Search MCP
//!
//! A client adapter for video search tools served over the Model Context
//! Protocol (MCP) on HTTP.
//!
//! ## Architecture
//!
//! - [`mcp`]: Protocol types, response decoding, session handshake and the tool invoker
//! - [`normalize`]: Mapping of structured and legacy tool payloads into one result schema
//! - [`models`]: Canonical results, media items and status reports
//! - [`utils`]: Retry with linear backoff
//! - [`config`]: Configuration management
//!
//! ## Example
//!
//! ```rust,no_run
//! use video_search_mcp::{ClientConfig, McpClient, SearchTool};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = McpClient::new(ClientConfig::new("http://localhost:8080"))?;
//! let outcome = client.search(SearchTool::Videos, "rust async", 10).await;
//! println!("{}", serde_json::to_string_pretty(&outcome)?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod mcp;
pub mod models;
pub mod normalize;
pub mod utils;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::CallError;
pub use mcp::McpClient;
pub use models::{CanonicalResult, SearchTool, ToolOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
