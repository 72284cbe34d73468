//! Content source abstraction for Distill.
//!
//! Provides a trait-based interface for the places content can come from:
//! a video's caption track or a web page's visible text.

mod html;
mod page;
mod robots;
mod youtube;

pub use html::{extract_page, PageExtract, UNTITLED_PAGE};
pub use page::PageSource;
pub use robots::RobotsPolicy;
pub use youtube::{
    join_caption_segments, select_caption_track, CaptionTrack, TrackFormat, VideoInfo, VideoSource,
};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Kind of content source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Video,
    Page,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Video => write!(f, "video"),
            SourceKind::Page => write!(f, "page"),
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "video" | "youtube" => Ok(SourceKind::Video),
            "page" | "web" => Ok(SourceKind::Page),
            _ => Err(format!("Unknown source kind: {}", s)),
        }
    }
}

/// Text acquired from a source, with whatever preview metadata it offers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedContent {
    /// The content itself. Never empty.
    pub text: String,
    /// Title of the video or page (if available).
    pub title: Option<String>,
    /// Thumbnail or preview image URL (if available).
    pub preview_image_url: Option<String>,
}

/// Trait for content source providers.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Get the source kind.
    fn kind(&self) -> SourceKind;

    /// Check if this source can handle the given locator.
    fn can_handle(&self, locator: &str) -> bool;

    /// Fetch the content behind a locator. Failures are never retried.
    async fn fetch(&self, locator: &str) -> Result<FetchedContent>;
}

/// Guess the source kind for a locator: URLs on a YouTube host and bare
/// video IDs are videos, anything else with an http(s) scheme is a page.
pub fn detect_kind(locator: &str) -> Option<SourceKind> {
    if youtube::extract_video_id(locator).is_some() {
        return Some(SourceKind::Video);
    }

    let url = url::Url::parse(locator.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(SourceKind::Page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_kind() {
        assert_eq!(
            detect_kind("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some(SourceKind::Video)
        );
        assert_eq!(detect_kind("dQw4w9WgXcQ"), Some(SourceKind::Video));
        assert_eq!(
            detect_kind("https://example.com/blog/post"),
            Some(SourceKind::Page)
        );
        assert_eq!(detect_kind("ftp://example.com/file"), None);
        assert_eq!(detect_kind("just some words"), None);
        assert_eq!(detect_kind("hello-world"), None);
        assert_eq!(
            detect_kind("https://example.com/?u=youtu.be/dQw4w9WgXcQ"),
            Some(SourceKind::Page)
        );
    }

    #[test]
    fn test_source_kind_from_str() {
        assert_eq!("Video".parse::<SourceKind>(), Ok(SourceKind::Video));
        assert_eq!("web".parse::<SourceKind>(), Ok(SourceKind::Page));
        assert!("podcast".parse::<SourceKind>().is_err());
    }
}
