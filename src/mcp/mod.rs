//! MCP (Model Context Protocol) client over HTTP.
//!
//! - [`protocol`]: JSON-RPC 2.0 envelope types
//! - [`decode`]: JSON or SSE-framed response bodies
//! - [`transport`]: POSTs to the single MCP endpoint
//! - [`session`]: session cache and handshake
//! - [`client`]: tool invocation with retry and normalization

pub mod client;
pub mod decode;
pub mod mock;
pub mod protocol;
pub mod session;
pub mod transport;

pub use client::{McpClient, DEFAULT_MAX_RESULTS};
pub use decode::{decode, DecodeError};
pub use mock::MockTransport;
pub use protocol::ToolDescriptor;
pub use session::{SessionManager, SessionState, SessionStore};
pub use transport::{HttpTransport, McpTransport, TransportError};
