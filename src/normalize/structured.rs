//! Structured JSON payloads.
//!
//! Current servers return a JSON object with `videos`, `channels` and
//! `playlists` arrays using the provider's field names:
//!
//! ```json
//! {
//!   "query": "rust",
//!   "total_results": 1,
//!   "videos": [{ "title": "A", "channel": "B", "views": "1,000", "video_id": "id1" }]
//! }
//! ```

use serde_json::{Map, Value};

use super::NormalizeStrategy;
use crate::models::{
    channel_id_from_url, playlist_id_from_url, video_id_from_url, CanonicalResult, ChannelItem,
    PlaylistItem, SearchTool, ToolOutcome, VideoItem, ZERO_COUNT,
};

/// Reads JSON object payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredStrategy;

impl NormalizeStrategy for StructuredStrategy {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn normalize(&self, raw: &str, tool: SearchTool) -> Option<ToolOutcome> {
        let payload = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(payload)) => payload,
            _ => return None,
        };

        if let Some(error) = payload.get("error").filter(|v| !v.is_null()) {
            return Some(ToolOutcome::error(text(error)));
        }

        let videos = items(&payload, "videos", video);
        let channels = items(&payload, "channels", channel);
        let playlists = items(&payload, "playlists", playlist);

        let query = payload.get("query").map(text).unwrap_or_default();
        let total = payload.get("total_results").and_then(as_count);

        Some(CanonicalResult::assemble(tool, query, total, videos, channels, playlists).into())
    }
}

fn items<T>(payload: &Map<String, Value>, key: &str, map: fn(&Map<String, Value>) -> T) -> Vec<T> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_object).map(map).collect())
        .unwrap_or_default()
}

fn video(item: &Map<String, Value>) -> VideoItem {
    let url = field(item, &["url"]);
    let video_id = id_or_else(field(item, &["video_id"]), || video_id_from_url(&url));

    VideoItem {
        title: field(item, &["title"]),
        channel_title: field(item, &["channel"]),
        view_count: count(item, &["views"]),
        like_count: count(item, &["likes"]),
        published_at: field(item, &["published"]),
        description: field(item, &["description"]),
        thumbnail: field(item, &["thumbnail"]),
        video_id,
        url,
    }
}

fn channel(item: &Map<String, Value>) -> ChannelItem {
    let url = field(item, &["url"]);
    let channel_id = id_or_else(field(item, &["channel_id"]), || channel_id_from_url(&url));

    ChannelItem {
        title: field(item, &["title"]),
        subscriber_count: count(item, &["subscribers"]),
        video_count: count(item, &["videos"]),
        view_count: count(item, &["views", "total_views"]),
        published_at: field(item, &["published", "created"]),
        description: field(item, &["description"]),
        thumbnail: field(item, &["thumbnail"]),
        channel_id,
        url,
    }
}

fn playlist(item: &Map<String, Value>) -> PlaylistItem {
    let url = field(item, &["url"]);
    let playlist_id = id_or_else(field(item, &["playlist_id"]), || {
        playlist_id_from_url(&url)
    });

    PlaylistItem {
        title: field(item, &["title"]),
        channel_title: field(item, &["channel"]),
        video_count: count(item, &["videos"]),
        published_at: field(item, &["published", "created"]),
        description: field(item, &["description"]),
        thumbnail: field(item, &["thumbnail"]),
        playlist_id,
        url,
    }
}

/// First present, non-null value among `keys`, as a string
fn lookup(item: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| item.get(*key))
        .find(|value| !value.is_null())
        .map(text)
}

fn field(item: &Map<String, Value>, keys: &[&str]) -> String {
    lookup(item, keys).unwrap_or_default()
}

fn count(item: &Map<String, Value>, keys: &[&str]) -> String {
    lookup(item, keys).unwrap_or_else(|| ZERO_COUNT.to_string())
}

fn id_or_else(id: String, recover: impl FnOnce() -> String) -> String {
    if id.is_empty() {
        recover()
    } else {
        id
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}
