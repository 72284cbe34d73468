//! YouTube transcript source.
//!
//! Caption tracks are discovered with yt-dlp and downloaded in YouTube's
//! `json3` timed-text format.

use super::{ContentSource, FetchedContent, SourceKind};
use crate::error::{DistillError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{debug, info, instrument};
use url::Url;

/// Caption format requested from YouTube.
const CAPTION_FORMAT: &str = "json3";

/// Hosts that serve YouTube watch pages or short links.
const VIDEO_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "www.youtube-nocookie.com",
    "youtu.be",
];

/// Path prefixes followed directly by a video ID.
const ID_PATH_PREFIXES: &[&str] = &["embed", "v", "shorts", "live"];

fn video_id_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("Invalid regex"))
}

fn is_video_id(candidate: &str) -> bool {
    video_id_regex().is_match(candidate)
}

/// Extract video ID from a YouTube URL or bare ID.
///
/// URLs must point at a YouTube host. A bare ID must also contain an
/// uppercase letter, digit or underscore, so lowercase words such as
/// `hello-world` are not taken for IDs.
pub(crate) fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    if is_video_id(input) {
        let distinctive = input
            .chars()
            .any(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
        return distinctive.then(|| input.to_string());
    }

    let url = match Url::parse(input) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{}", input)).ok()?,
        Err(_) => return None,
    };
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = url.host_str()?.to_ascii_lowercase();
    if !VIDEO_HOSTS.contains(&host.as_str()) {
        return None;
    }

    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let candidate = if host == "youtu.be" {
        segments.next()?.to_string()
    } else {
        match segments.next()? {
            "watch" => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())?,
            prefix if ID_PATH_PREFIXES.contains(&prefix) => segments.next()?.to_string(),
            _ => return None,
        }
    };

    is_video_id(&candidate).then_some(candidate)
}

/// The parts of yt-dlp's `--dump-json` output we use.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoInfo {
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    /// Uploaded (manually created) caption tracks by language code.
    #[serde(default)]
    pub subtitles: HashMap<String, Vec<TrackFormat>>,
    /// Auto-generated caption tracks by language code.
    #[serde(default)]
    pub automatic_captions: HashMap<String, Vec<TrackFormat>>,
}

/// One downloadable rendition of a caption track.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackFormat {
    pub ext: Option<String>,
    pub url: Option<String>,
}

/// A caption track chosen for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    pub language: String,
    pub automatic: bool,
    pub url: String,
}

impl VideoInfo {
    /// Pick a caption track in one of `languages`.
    ///
    /// Uploaded tracks win over auto-generated ones. Within each group the
    /// languages are tried in order, exact code (`en`) before regional
    /// variants (`en-GB`, `en-US`).
    pub fn caption_track(&self, languages: &[String]) -> Option<CaptionTrack> {
        [(&self.subtitles, false), (&self.automatic_captions, true)]
            .into_iter()
            .find_map(|(tracks, automatic)| {
                languages
                    .iter()
                    .find_map(|lang| select_caption_track(tracks, lang, automatic))
            })
    }
}

/// Find a `json3` rendition for `lang` in one track map.
pub fn select_caption_track(
    tracks: &HashMap<String, Vec<TrackFormat>>,
    lang: &str,
    automatic: bool,
) -> Option<CaptionTrack> {
    let prefix = format!("{}-", lang);
    let mut variants: Vec<&String> = tracks
        .keys()
        .filter(|key| key.starts_with(&prefix))
        .collect();
    variants.sort();

    tracks
        .get_key_value(lang)
        .map(|(key, _)| key)
        .into_iter()
        .chain(variants)
        .find_map(|key| {
            let url = tracks[key]
                .iter()
                .find(|f| f.ext.as_deref() == Some(CAPTION_FORMAT))
                .and_then(|f| f.url.clone())?;
            Some(CaptionTrack {
                language: key.clone(),
                automatic,
                url,
            })
        })
}

#[derive(Deserialize)]
struct TimedText {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Deserialize)]
struct TimedTextEvent {
    #[serde(default)]
    segs: Vec<TimedTextSeg>,
}

#[derive(Deserialize)]
struct TimedTextSeg {
    #[serde(default)]
    utf8: String,
}

/// Join the caption segments of a `json3` document into one string.
///
/// Each event is one caption segment; segments are separated by a single
/// space and line breaks inside a caption become spaces.
pub fn join_caption_segments(body: &str) -> Result<String> {
    let timed: TimedText = serde_json::from_str(body).map_err(|e| {
        DistillError::TranscriptUnavailable(format!("Failed to parse caption track: {}", e))
    })?;

    let segments: Vec<String> = timed
        .events
        .iter()
        .map(|event| {
            let raw: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            raw.split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .filter(|text| !text.is_empty())
        .collect();

    if segments.is_empty() {
        return Err(DistillError::TranscriptUnavailable(
            "Caption track contains no text".to_string(),
        ));
    }

    Ok(segments.join(" "))
}

/// YouTube transcript source.
pub struct VideoSource {
    client: reqwest::Client,
    yt_dlp_path: String,
    languages: Vec<String>,
}

impl VideoSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_config(client, "yt-dlp", vec!["en".to_string()])
    }

    pub fn with_config(client: reqwest::Client, yt_dlp_path: &str, languages: Vec<String>) -> Self {
        Self {
            client,
            yt_dlp_path: yt_dlp_path.to_string(),
            languages,
        }
    }

    /// Fetch video info (title, thumbnail, caption tracks) using yt-dlp.
    async fn fetch_info_ytdlp(&self, video_id: &str) -> Result<VideoInfo> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);

        let output = tokio::process::Command::new(&self.yt_dlp_path)
            .args(["--dump-json", "--skip-download", "--no-warnings", "--no-playlist", &url])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DistillError::ToolNotFound(self.yt_dlp_path.clone())
                } else {
                    DistillError::TranscriptUnavailable(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DistillError::TranscriptUnavailable(format!(
                "Video {} not found or unavailable: {}",
                video_id,
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            DistillError::TranscriptUnavailable(format!("Failed to parse yt-dlp output: {}", e))
        })
    }

    /// Select a caption track from `info` and download its text.
    pub async fn fetch_transcript(&self, video_id: &str, info: &VideoInfo) -> Result<String> {
        let track = info.caption_track(&self.languages).ok_or_else(|| {
            DistillError::TranscriptUnavailable(format!(
                "No transcript in [{}] for video {}",
                self.languages.join(", "),
                video_id
            ))
        })?;

        debug!(
            "Using {} caption track '{}'",
            if track.automatic { "auto-generated" } else { "uploaded" },
            track.language
        );

        let body = self
            .client
            .get(&track.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                DistillError::TranscriptUnavailable(format!("Failed to download captions: {}", e))
            })?
            .text()
            .await
            .map_err(|e| {
                DistillError::TranscriptUnavailable(format!("Failed to read captions: {}", e))
            })?;

        join_caption_segments(&body)
    }
}

#[async_trait]
impl ContentSource for VideoSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Video
    }

    fn can_handle(&self, locator: &str) -> bool {
        extract_video_id(locator).is_some()
    }

    #[instrument(skip(self))]
    async fn fetch(&self, locator: &str) -> Result<FetchedContent> {
        let video_id = extract_video_id(locator).ok_or_else(|| {
            DistillError::InvalidInput(format!("Invalid YouTube video ID or URL: {}", locator))
        })?;

        let info = self.fetch_info_ytdlp(&video_id).await?;
        let text = self.fetch_transcript(&video_id, &info).await?;
        info!("Fetched transcript for {} ({} chars)", video_id, text.len());

        Ok(FetchedContent {
            text,
            title: info.title,
            preview_image_url: info.thumbnail,
        })
    }
}
