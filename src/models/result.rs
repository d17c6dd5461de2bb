//! Canonical tool results.

use serde::{Deserialize, Serialize};

use super::media::{ChannelItem, ContentType, PlaylistItem, VideoItem};
use super::tool::SearchTool;

/// The normalized result of a search tool call.
///
/// The list fields present depend only on the tool that was invoked: a
/// single-type tool carries its own list, the "all" tool carries all three.
/// A covered list is always present (possibly empty); an uncovered list is
/// absent from the serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalResult {
    pub query: String,

    pub total_results: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub videos: Option<Vec<VideoItem>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<ChannelItem>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlists: Option<Vec<PlaylistItem>>,
}

impl CanonicalResult {
    /// Assemble a result for `tool`, keeping only the lists it covers.
    ///
    /// `total_results` falls back to the sum of all list lengths when `total`
    /// is `None`.
    pub fn assemble(
        tool: SearchTool,
        query: impl Into<String>,
        total: Option<u64>,
        videos: Vec<VideoItem>,
        channels: Vec<ChannelItem>,
        playlists: Vec<PlaylistItem>,
    ) -> Self {
        let total_results =
            total.unwrap_or((videos.len() + channels.len() + playlists.len()) as u64);

        Self {
            query: query.into(),
            total_results,
            videos: tool.covers(ContentType::Video).then_some(videos),
            channels: tool.covers(ContentType::Channel).then_some(channels),
            playlists: tool.covers(ContentType::Playlist).then_some(playlists),
        }
    }

    /// An empty result for `tool`
    pub fn empty(tool: SearchTool, query: impl Into<String>) -> Self {
        Self::assemble(tool, query, None, Vec::new(), Vec::new(), Vec::new())
    }

    /// Videos, or an empty slice if the tool does not cover videos
    pub fn videos(&self) -> &[VideoItem] {
        self.videos.as_deref().unwrap_or_default()
    }

    /// Channels, or an empty slice if the tool does not cover channels
    pub fn channels(&self) -> &[ChannelItem] {
        self.channels.as_deref().unwrap_or_default()
    }

    /// Playlists, or an empty slice if the tool does not cover playlists
    pub fn playlists(&self) -> &[PlaylistItem] {
        self.playlists.as_deref().unwrap_or_default()
    }

    /// Number of items across all lists
    pub fn item_count(&self) -> usize {
        self.videos().len() + self.channels().len() + self.playlists().len()
    }
}

/// What a tool call resolves to: a canonical result or an `{error}` object.
///
/// Callers never see a raised error from the adapter; every path ends in one
/// of these two variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolOutcome {
    Error { error: String },
    Results(CanonicalResult),
}

impl ToolOutcome {
    /// Build an error outcome
    pub fn error(message: impl Into<String>) -> Self {
        ToolOutcome::Error {
            error: message.into(),
        }
    }

    /// Whether this outcome is an error
    pub fn is_error(&self) -> bool {
        matches!(self, ToolOutcome::Error { .. })
    }

    /// The error message, if any
    pub fn error_message(&self) -> Option<&str> {
        match self {
            ToolOutcome::Error { error } => Some(error),
            ToolOutcome::Results(_) => None,
        }
    }

    /// The canonical result, if any
    pub fn results(&self) -> Option<&CanonicalResult> {
        match self {
            ToolOutcome::Results(result) => Some(result),
            ToolOutcome::Error { .. } => None,
        }
    }

    /// Convert into a standard `Result`
    pub fn into_result(self) -> Result<CanonicalResult, String> {
        match self {
            ToolOutcome::Results(result) => Ok(result),
            ToolOutcome::Error { error } => Err(error),
        }
    }
}

impl From<CanonicalResult> for ToolOutcome {
    fn from(result: CanonicalResult) -> Self {
        ToolOutcome::Results(result)
    }
}
