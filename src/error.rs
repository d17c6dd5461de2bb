//! Error taxonomy for MCP tool calls.
//!
//! Every failure a tool call can meet is one of these variants. The invoker
//! turns each into either a retry decision or a uniform `{error}` result; the
//! `Display` strings are the messages callers see.

use serde_json::Value;

use crate::mcp::decode::DecodeError;
use crate::mcp::protocol::{JsonRpcError, INVALID_PARAMS};
use crate::mcp::transport::TransportError;
use crate::utils::Retryable;

/// Errors that can occur during a single MCP exchange
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// Network, timeout or non-success HTTP status
    #[error("MCP Server error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with an empty body
    #[error("MCP Server returned empty response (server may still be initializing)")]
    EmptyBody,

    /// The body was neither JSON nor SSE-framed JSON
    #[error("MCP Server error: Invalid response format (neither JSON nor SSE)")]
    Decode(#[from] DecodeError),

    /// The server has not finished initializing
    #[error("MCP Server is still initializing. Please try again in a moment.")]
    NotYetInitialized { message: String },

    /// The server rejected the tool arguments
    #[error("MCP Parameter Error: {message}. Check the tool parameters and types.")]
    InvalidParameters { message: String },

    /// Any other protocol error, surfaced as-is
    #[error("MCP Error: {message}")]
    Protocol {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    /// A successful response without a content item
    #[error("No content returned from MCP server")]
    NoContent,

    /// The tool ran and reported its own failure (`isError: true`)
    #[error("MCP Tool Error: {message}")]
    ToolFailed { message: String },
}

impl CallError {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CallError::Transport(_)
                | CallError::EmptyBody
                | CallError::Decode(_)
                | CallError::NotYetInitialized { .. }
        )
    }

    /// Whether the cached session must be dropped
    pub fn invalidates_session(&self) -> bool {
        matches!(
            self,
            CallError::InvalidParameters { .. } | CallError::Transport(TransportError::Status(404))
        )
    }
}

impl Retryable for CallError {
    fn is_retryable(&self) -> bool {
        CallError::is_retryable(self)
    }
}

/// Classify a JSON-RPC error object.
///
/// The "not yet initialized" check is a case-insensitive substring match on
/// the message because servers expose no dedicated code for it. It is fragile:
/// keep it confined here and replace it with a code check once servers send
/// one. Do not add more substring rules.
pub fn classify_rpc_error(error: JsonRpcError) -> CallError {
    if indicates_not_initialized(&error.message) {
        CallError::NotYetInitialized {
            message: error.message,
        }
    } else if error.code == INVALID_PARAMS {
        CallError::InvalidParameters {
            message: error.message,
        }
    } else {
        CallError::Protocol {
            code: error.code,
            message: error.message,
            data: error.data,
        }
    }
}

fn indicates_not_initialized(message: &str) -> bool {
    message.to_lowercase().contains("initialization")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rpc_error(code: i64, message: &str) -> JsonRpcError {
        JsonRpcError {
            code,
            message: message.to_string(),
            data: None,
        }
    }

    #[test]
    fn test_classify_not_initialized() {
        let err = classify_rpc_error(rpc_error(
            -32600,
            "Received request before Initialization was complete",
        ));
        assert!(matches!(err, CallError::NotYetInitialized { .. }));
        assert!(err.is_retryable());
        assert!(!err.invalidates_session());
    }

    #[test]
    fn test_initialization_message_wins_over_code() {
        let err = classify_rpc_error(rpc_error(INVALID_PARAMS, "before initialization"));
        assert!(matches!(err, CallError::NotYetInitialized { .. }));
    }

    #[test]
    fn test_classify_invalid_params() {
        let err = classify_rpc_error(rpc_error(INVALID_PARAMS, "max_results must be int"));
        assert!(matches!(err, CallError::InvalidParameters { .. }));
        assert!(!err.is_retryable());
        assert!(err.invalidates_session());
        assert_eq!(
            err.to_string(),
            "MCP Parameter Error: max_results must be int. Check the tool parameters and types."
        );
    }

    #[test]
    fn test_classify_other() {
        let err = classify_rpc_error(rpc_error(-32601, "Method not found"));
        assert!(!err.is_retryable());
        assert!(!err.invalidates_session());
        assert_eq!(err.to_string(), "MCP Error: Method not found");
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(CallError::EmptyBody.is_retryable());
        assert!(CallError::Decode(DecodeError::NoDataLine).is_retryable());
        assert!(CallError::Transport(TransportError::Status(500)).is_retryable());
        assert!(!CallError::NoContent.is_retryable());
    }

    #[test]
    fn test_tool_failure_is_final() {
        let err = CallError::ToolFailed {
            message: "quota exceeded".to_string(),
        };
        assert!(!err.is_retryable());
        assert!(!err.invalidates_session());
        assert_eq!(err.to_string(), "MCP Tool Error: quota exceeded");
    }

    #[test]
    fn test_expired_session_status_invalidates() {
        assert!(CallError::Transport(TransportError::Status(404)).invalidates_session());
        assert!(!CallError::Transport(TransportError::Status(500)).invalidates_session());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            CallError::EmptyBody.to_string(),
            "MCP Server returned empty response (server may still be initializing)"
        );
        assert_eq!(
            CallError::Decode(DecodeError::NoDataLine).to_string(),
            "MCP Server error: Invalid response format (neither JSON nor SSE)"
        );
        assert_eq!(
            CallError::NotYetInitialized {
                message: "x".into()
            }
            .to_string(),
            "MCP Server is still initializing. Please try again in a moment."
        );
        assert_eq!(
            CallError::Transport(TransportError::Status(502)).to_string(),
            "MCP Server error: HTTP status 502"
        );
    }
}
