//! Legacy delimited-text payloads.
//!
//! Older servers answer with sections of bulleted items:
//!
//! ```text
//! VIDEOS:
//! • Some title
//! Channel: Some channel
//! URL: https://www.youtube.com/watch?v=abc
//!
//! SUMMARY: Found 12 results
//! ```
//!
//! or with labeled blocks terminated by `---`:
//!
//! ```text
//! VIDEO: Some title
//! Channel: Some channel
//! Views: 1,000
//! URL: https://www.youtube.com/watch?v=abc
//! Description: First words...
//! ---
//! ```
//!
//! Items without a title are dropped.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use super::NormalizeStrategy;
use crate::models::{
    channel_id_from_url, playlist_id_from_url, video_id_from_url, CanonicalResult, ChannelItem,
    ContentType, PlaylistItem, SearchTool, ToolOutcome, VideoItem, ZERO_COUNT,
};

/// Bullet markers, including the garbled forms older servers emit when the
/// UTF-8 bullet is decoded as Latin-1, with and without the C1 control byte
const BULLETS: [&str; 3] = ["\u{2022}", "\u{e2}\u{80}\u{a2}", "\u{e2}\u{a2}"];

const BLOCK_TERMINATOR: &str = "---";

const FIELD_LABELS: [&str; 10] = [
    "Channel",
    "URL",
    "Views",
    "Likes",
    "Published",
    "Description",
    "Subscribers",
    "Videos",
    "Total Views",
    "Created",
];

/// Reads delimited-text payloads. Accepts any text, so it belongs last in a chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyTextStrategy;

impl NormalizeStrategy for LegacyTextStrategy {
    fn name(&self) -> &'static str {
        "legacy-text"
    }

    fn normalize(&self, raw: &str, tool: SearchTool) -> Option<ToolOutcome> {
        let mut parser = Parser::default();
        for line in raw.lines() {
            parser.feed(line.trim());
        }
        Some(parser.finish(tool).into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Bullet,
    Block,
}

/// An item whose fields are still being collected
#[derive(Debug)]
struct PendingItem {
    kind: ContentType,
    shape: Shape,
    title: String,
    fields: HashMap<&'static str, String>,
}

impl PendingItem {
    fn new(kind: ContentType, shape: Shape, title: &str) -> Self {
        Self {
            kind,
            shape,
            title: title.trim().to_string(),
            fields: HashMap::new(),
        }
    }

    fn get(&self, labels: &[&str]) -> Option<String> {
        labels
            .iter()
            .find_map(|label| self.fields.get(*label))
            .cloned()
    }

    fn field(&self, labels: &[&str]) -> String {
        self.get(labels).unwrap_or_default()
    }

    fn count(&self, labels: &[&str]) -> String {
        self.get(labels).unwrap_or_else(|| ZERO_COUNT.to_string())
    }

    fn description(&self) -> String {
        let description = self.field(&["Description"]);
        match self.shape {
            Shape::Block => description
                .strip_suffix("...")
                .map(str::to_string)
                .unwrap_or(description),
            Shape::Bullet => description,
        }
    }
}

#[derive(Debug, Default)]
struct Parser {
    section: Option<ContentType>,
    pending: Option<PendingItem>,
    videos: Vec<VideoItem>,
    channels: Vec<ChannelItem>,
    playlists: Vec<PlaylistItem>,
    total: u64,
}

impl Parser {
    fn feed(&mut self, line: &str) {
        if line.is_empty() {
            // A blank line ends a bullet item; blocks run until their terminator
            if matches!(&self.pending, Some(item) if item.shape == Shape::Bullet) {
                self.flush();
            }
            return;
        }

        if let Some(kind) = section_header(line) {
            self.flush();
            self.section = Some(kind);
            return;
        }

        if line.starts_with("SUMMARY:") || line.starts_with("SUCCESS:") {
            self.flush();
            self.read_summary(line);
            self.section = None;
            return;
        }

        if line.starts_with(BLOCK_TERMINATOR) {
            self.flush();
            return;
        }

        if let Some((kind, title)) = block_label(line) {
            self.flush();
            self.pending = Some(PendingItem::new(kind, Shape::Block, title));
            return;
        }

        if let Some(title) = strip_bullet(line) {
            self.flush();
            if let Some(kind) = self.section {
                self.pending = Some(PendingItem::new(kind, Shape::Bullet, title));
            }
            return;
        }

        if let Some((label, value)) = labeled_field(line) {
            if let Some(item) = self.pending.as_mut() {
                item.fields.insert(label, value.to_string());
                if label == "Description" && item.shape == Shape::Block {
                    self.flush();
                }
            }
        }
    }

    fn read_summary(&mut self, line: &str) {
        if line.contains("Found") && line.contains("results") {
            let total = found_results(line).unwrap_or_else(|| self.item_count());
            self.total = total;
        } else if let Some(count) = video_total(line) {
            self.total += count;
        }
    }

    fn item_count(&self) -> u64 {
        (self.videos.len() + self.channels.len() + self.playlists.len()) as u64
    }

    fn flush(&mut self) {
        let Some(item) = self.pending.take() else {
            return;
        };
        if item.title.is_empty() {
            tracing::debug!(kind = ?item.kind, "dropping legacy item without a title");
            return;
        }

        match item.kind {
            ContentType::Video => self.videos.push(video(&item)),
            ContentType::Channel => self.channels.push(channel(&item)),
            ContentType::Playlist => self.playlists.push(playlist(&item)),
        }
    }

    fn finish(mut self, tool: SearchTool) -> CanonicalResult {
        self.flush();
        let total = (self.total > 0).then_some(self.total);
        CanonicalResult::assemble(
            tool,
            String::new(),
            total,
            self.videos,
            self.channels,
            self.playlists,
        )
    }
}

fn video(item: &PendingItem) -> VideoItem {
    let url = item.field(&["URL"]);
    VideoItem {
        title: item.title.clone(),
        channel_title: item.field(&["Channel"]),
        view_count: item.count(&["Views"]),
        like_count: item.count(&["Likes"]),
        published_at: item.field(&["Published"]),
        description: item.description(),
        video_id: video_id_from_url(&url),
        thumbnail: String::new(),
        url,
    }
}

fn channel(item: &PendingItem) -> ChannelItem {
    let url = item.field(&["URL"]);
    ChannelItem {
        title: item.title.clone(),
        subscriber_count: item.count(&["Subscribers"]),
        video_count: item.count(&["Videos"]),
        view_count: item.count(&["Total Views", "Views"]),
        published_at: item.field(&["Created", "Published"]),
        description: item.description(),
        channel_id: channel_id_from_url(&url),
        thumbnail: String::new(),
        url,
    }
}

fn playlist(item: &PendingItem) -> PlaylistItem {
    let url = item.field(&["URL"]);
    PlaylistItem {
        title: item.title.clone(),
        channel_title: item.field(&["Channel"]),
        video_count: item.count(&["Videos"]),
        published_at: item.field(&["Created", "Published"]),
        description: item.description(),
        playlist_id: playlist_id_from_url(&url),
        thumbnail: String::new(),
        url,
    }
}

fn section_header(line: &str) -> Option<ContentType> {
    if line.starts_with("VIDEOS:") {
        Some(ContentType::Video)
    } else if line.starts_with("CHANNELS:") {
        Some(ContentType::Channel)
    } else if line.starts_with("PLAYLISTS:") {
        Some(ContentType::Playlist)
    } else {
        None
    }
}

fn block_label(line: &str) -> Option<(ContentType, &str)> {
    if let Some(title) = line.strip_prefix("VIDEO:") {
        Some((ContentType::Video, title))
    } else if let Some(title) = line.strip_prefix("CHANNEL:") {
        Some((ContentType::Channel, title))
    } else {
        line.strip_prefix("PLAYLIST:")
            .map(|title| (ContentType::Playlist, title))
    }
}

fn strip_bullet(line: &str) -> Option<&str> {
    BULLETS
        .iter()
        .find_map(|bullet| line.strip_prefix(bullet))
        .map(str::trim)
}

fn labeled_field(line: &str) -> Option<(&'static str, &str)> {
    let (label, value) = line.split_once(':')?;
    let label = FIELD_LABELS.iter().find(|known| **known == label.trim())?;
    Some((*label, value.trim()))
}

fn found_results(line: &str) -> Option<u64> {
    static FOUND: OnceLock<Option<Regex>> = OnceLock::new();
    let re = FOUND
        .get_or_init(|| Regex::new(r"Found\s+(\d+)\s+results").ok())
        .as_ref()?;
    re.captures(line)?.get(1)?.as_str().parse().ok()
}

fn video_total(line: &str) -> Option<u64> {
    static VIDEOS: OnceLock<Option<Regex>> = OnceLock::new();
    let re = VIDEOS
        .get_or_init(|| Regex::new(r"Videos:\s*(\d+)").ok())
        .as_ref()?;
    re.captures(line)?.get(1)?.as_str().parse().ok()
}
