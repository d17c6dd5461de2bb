//! Canonical media item models.
//!
//! Every tool response, whichever wire layout produced it, is mapped into
//! these three shapes. Counts are kept as display strings (the provider
//! formats them, e.g. `"1,000"`); missing values default to `"0"` for counts
//! and to an empty string for everything else.

use serde::{Deserialize, Serialize};
use url::Url;

/// Default value for count fields
pub const ZERO_COUNT: &str = "0";

/// Content types a search tool can return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Video,
    Channel,
    Playlist,
}

/// A video search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub title: String,
    pub channel_title: String,
    pub view_count: String,
    pub like_count: String,
    pub published_at: String,
    pub url: String,
    pub description: String,
    pub video_id: String,
    pub thumbnail: String,
}

impl Default for VideoItem {
    fn default() -> Self {
        Self {
            title: String::new(),
            channel_title: String::new(),
            view_count: ZERO_COUNT.to_string(),
            like_count: ZERO_COUNT.to_string(),
            published_at: String::new(),
            url: String::new(),
            description: String::new(),
            video_id: String::new(),
            thumbnail: String::new(),
        }
    }
}

/// A channel search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelItem {
    pub title: String,
    pub subscriber_count: String,
    pub video_count: String,
    pub view_count: String,
    pub published_at: String,
    pub url: String,
    pub description: String,
    pub channel_id: String,
    pub thumbnail: String,
}

impl Default for ChannelItem {
    fn default() -> Self {
        Self {
            title: String::new(),
            subscriber_count: ZERO_COUNT.to_string(),
            video_count: ZERO_COUNT.to_string(),
            view_count: ZERO_COUNT.to_string(),
            published_at: String::new(),
            url: String::new(),
            description: String::new(),
            channel_id: String::new(),
            thumbnail: String::new(),
        }
    }
}

/// A playlist search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    pub title: String,
    pub channel_title: String,
    pub video_count: String,
    pub published_at: String,
    pub url: String,
    pub description: String,
    pub playlist_id: String,
    pub thumbnail: String,
}

impl Default for PlaylistItem {
    fn default() -> Self {
        Self {
            title: String::new(),
            channel_title: String::new(),
            video_count: ZERO_COUNT.to_string(),
            published_at: String::new(),
            url: String::new(),
            description: String::new(),
            playlist_id: String::new(),
            thumbnail: String::new(),
        }
    }
}

/// Any one of the canonical item shapes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediaItem {
    Video(VideoItem),
    Channel(ChannelItem),
    Playlist(PlaylistItem),
}

impl MediaItem {
    /// The content type of this item
    pub fn content_type(&self) -> ContentType {
        match self {
            MediaItem::Video(_) => ContentType::Video,
            MediaItem::Channel(_) => ContentType::Channel,
            MediaItem::Playlist(_) => ContentType::Playlist,
        }
    }

    /// The item title
    pub fn title(&self) -> &str {
        match self {
            MediaItem::Video(v) => &v.title,
            MediaItem::Channel(c) => &c.title,
            MediaItem::Playlist(p) => &p.title,
        }
    }
}

/// Recover a video id from a watch URL (`v=` query value)
pub fn video_id_from_url(url: &str) -> String {
    query_value(url, "v")
}

/// Recover a playlist id from a playlist URL (`list=` query value)
pub fn playlist_id_from_url(url: &str) -> String {
    query_value(url, "list")
}

/// Recover a channel id from a channel URL (last path segment)
pub fn channel_id_from_url(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }

    if let Ok(parsed) = Url::parse(url) {
        if let Some(segment) = parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        {
            return segment.to_string();
        }
    }

    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

fn query_value(url: &str, key: &str) -> String {
    if let Ok(parsed) = Url::parse(url) {
        if let Some((_, value)) = parsed.query_pairs().find(|(k, _)| k == key) {
            return value.into_owned();
        }
    }

    // Relative or malformed URLs: take whatever follows the last `key=`
    let marker = format!("{}=", key);
    match url.rfind(&marker) {
        Some(pos) => url[pos + marker.len()..]
            .split('&')
            .next()
            .unwrap_or_default()
            .to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_zero_counts() {
        let video = VideoItem::default();
        assert_eq!(video.view_count, "0");
        assert_eq!(video.like_count, "0");
        assert_eq!(video.title, "");

        let channel = ChannelItem::default();
        assert_eq!(channel.subscriber_count, "0");
        assert_eq!(channel.video_count, "0");

        let playlist = PlaylistItem::default();
        assert_eq!(playlist.video_count, "0");
    }

    #[test]
    fn test_video_serializes_camel_case() {
        let video = VideoItem {
            title: "A".to_string(),
            video_id: "id1".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&video).unwrap();
        assert_eq!(json["videoId"], "id1");
        assert_eq!(json["channelTitle"], "");
        assert_eq!(json["viewCount"], "0");
        assert!(json.get("video_id").is_none());
    }

    #[test]
    fn test_video_id_from_url() {
        assert_eq!(
            video_id_from_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            video_id_from_url("https://www.youtube.com/watch?v=abc&t=10s"),
            "abc"
        );
        assert_eq!(video_id_from_url("/watch?v=xyz"), "xyz");
        assert_eq!(video_id_from_url("https://example.com/"), "");
        assert_eq!(video_id_from_url(""), "");
    }

    #[test]
    fn test_playlist_id_from_url() {
        assert_eq!(
            playlist_id_from_url("https://www.youtube.com/playlist?list=PL123"),
            "PL123"
        );
        assert_eq!(playlist_id_from_url("https://www.youtube.com/playlist"), "");
    }

    #[test]
    fn test_channel_id_from_url() {
        assert_eq!(
            channel_id_from_url("https://www.youtube.com/channel/UCabc"),
            "UCabc"
        );
        assert_eq!(
            channel_id_from_url("https://www.youtube.com/channel/UCabc/"),
            "UCabc"
        );
        assert_eq!(channel_id_from_url("channel/UCxyz"), "UCxyz");
        assert_eq!(channel_id_from_url(""), "");
    }

    #[test]
    fn test_media_item_accessors() {
        let item = MediaItem::Playlist(PlaylistItem {
            title: "Mix".to_string(),
            ..Default::default()
        });
        assert_eq!(item.content_type(), ContentType::Playlist);
        assert_eq!(item.title(), "Mix");
    }
}
