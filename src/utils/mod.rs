//! Utility modules supporting MCP calls.
//!
//! - [`RetryPolicy`]: Linear backoff configuration
//! - [`with_retry`]: Execute an operation with automatic retry on retryable errors
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use video_search_mcp::utils::{with_retry, RetryPolicy};
//! use video_search_mcp::CallError;
//!
//! # async fn fetch() -> Result<String, CallError> { Ok("data".to_string()) }
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = RetryPolicy::new(3);
//! let result = with_retry(policy, |_attempt| fetch()).await?;
//! # Ok(())
//! # }
//! ```

mod retry;

pub use retry::{with_retry, RetryPolicy, Retryable};
