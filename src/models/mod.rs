//! Core data models for search results and server status.

mod media;
mod result;
mod status;
mod tool;

pub use media::{
    channel_id_from_url, playlist_id_from_url, video_id_from_url, ChannelItem, ContentType,
    MediaItem, PlaylistItem, VideoItem, ZERO_COUNT,
};
pub use result::{CanonicalResult, ToolOutcome};
pub use status::{ConnectionState, HealthReport, HealthStatus, ServerState, SessionStatus};
pub use tool::SearchTool;
