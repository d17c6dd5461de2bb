//! Known remote search tools.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::media::ContentType;

/// The search tools exposed by the video search MCP server.
///
/// Each tool covers one content type except [`SearchTool::All`], which covers
/// all three. The "all" search is a single call to its own tool; it is never
/// emulated with a combined content-type filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchTool {
    Videos,
    Channels,
    Playlists,
    All,
}

impl SearchTool {
    /// Wire name of the tool
    pub fn name(&self) -> &'static str {
        match self {
            SearchTool::Videos => "search_youtube_videos",
            SearchTool::Channels => "search_youtube_channels",
            SearchTool::Playlists => "search_youtube_playlists",
            SearchTool::All => "search_youtube_all",
        }
    }

    /// Resolve a tool from its wire name.
    ///
    /// Unknown names resolve to [`SearchTool::All`] so that a result for an
    /// unrecognised tool keeps every list it carries.
    pub fn from_name(name: &str) -> Self {
        match name {
            "search_youtube_videos" => SearchTool::Videos,
            "search_youtube_channels" => SearchTool::Channels,
            "search_youtube_playlists" => SearchTool::Playlists,
            _ => SearchTool::All,
        }
    }

    /// Whether results of this tool carry the given content type
    pub fn covers(&self, content: ContentType) -> bool {
        match self {
            SearchTool::Videos => content == ContentType::Video,
            SearchTool::Channels => content == ContentType::Channel,
            SearchTool::Playlists => content == ContentType::Playlist,
            SearchTool::All => true,
        }
    }
}

impl fmt::Display for SearchTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
