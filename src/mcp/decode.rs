//! Response body decoding.
//!
//! MCP servers answer a POST either with a bare JSON body or with a
//! Server-Sent-Events stream whose events carry the JSON in `data: ` lines.
//! Only the first `data: ` line is consulted.

use serde_json::Value;

/// Prefix of an SSE data line
pub const SSE_DATA_PREFIX: &str = "data: ";

/// Errors decoding a response body
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Body is neither JSON nor contains a `data: ` line
    #[error("no JSON body and no SSE data line")]
    NoDataLine,

    /// The first `data: ` line does not hold valid JSON
    #[error("invalid JSON in SSE data line: {0}")]
    InvalidData(#[from] serde_json::Error),
}

/// Decode a response body into a JSON value regardless of framing.
///
/// A strict parse of the whole body is attempted first; on failure the body
/// is scanned as an SSE stream.
pub fn decode(body: &str) -> Result<Value, DecodeError> {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => Ok(value),
        Err(_) => decode_sse(body),
    }
}

/// Decode the first `data: ` line of an SSE body.
pub fn decode_sse(body: &str) -> Result<Value, DecodeError> {
    let data = body
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix(SSE_DATA_PREFIX))
        .ok_or(DecodeError::NoDataLine)?;

    Ok(serde_json::from_str(data)?)
}

/// Decode raw bytes, replacing invalid UTF-8.
pub fn decode_bytes(body: &[u8]) -> Result<Value, DecodeError> {
    decode(&String::from_utf8_lossy(body))
}
