//! Video details: title, channel, publish date, duration and thumbnail.
//!
//! Two upstream shapes are understood: the Data API `videos` listing
//! (requires an API key) and the keyless `oEmbed` document, which carries no
//! publish date or duration.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::youtube::error::TranscriptError;

/// ISO-8601 duration as used by the Data API, e.g. `PT1H2M3S` or `P1DT5M`.
const ISO_DURATION_PATTERN: &str =
    r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$";

/// Thumbnail sizes tried in order.
const THUMBNAIL_PREFERENCE: [&str; 4] = ["high", "medium", "standard", "default"];

/// Metadata shown next to a summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Video id.
    pub video_id: String,
    /// Video title.
    pub title: String,
    /// Channel that published the video.
    pub channel_title: String,
    /// Publish time, when known.
    pub published_at: Option<DateTime<Utc>>,
    /// Length formatted as `H:MM:SS`, when known.
    pub duration: Option<String>,
    /// Thumbnail URL, when known.
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    snippet: Snippet,
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    channel_title: String,
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    thumbnails: HashMap<String, Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: String,
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: String,
    author_name: String,
    thumbnail_url: Option<String>,
}

/// Build [`VideoInfo`] from a Data API `videos?part=snippet,contentDetails` body.
///
/// # Errors
/// Returns [`TranscriptError::VideoNotFound`] if the listing is empty and
/// [`TranscriptError::Parse`] if the body is not the expected JSON.
pub fn info_from_data_api(video_id: &str, body: &str) -> Result<VideoInfo, TranscriptError> {
    let listing: VideoListResponse =
        serde_json::from_str(body).map_err(|e| TranscriptError::Parse(e.to_string()))?;
    let item = listing
        .items
        .into_iter()
        .next()
        .ok_or_else(|| TranscriptError::VideoNotFound(video_id.to_string()))?;

    let mut thumbnails = item.snippet.thumbnails;
    let thumbnail_url = THUMBNAIL_PREFERENCE
        .iter()
        .find_map(|size| thumbnails.remove(*size))
        .map(|thumb| thumb.url);

    let duration = item
        .content_details
        .map(|details| parse_iso8601_duration(&details.duration))
        .transpose()?
        .flatten()
        .map(format_duration);

    Ok(VideoInfo {
        video_id: video_id.to_string(),
        title: item.snippet.title,
        channel_title: item.snippet.channel_title,
        published_at: item.snippet.published_at,
        duration,
        thumbnail_url,
    })
}

/// Build [`VideoInfo`] from an `oEmbed` document.
///
/// # Errors
/// Returns [`TranscriptError::Parse`] if the body is not the expected JSON.
pub fn info_from_oembed(video_id: &str, body: &str) -> Result<VideoInfo, TranscriptError> {
    let embed: OEmbedResponse =
        serde_json::from_str(body).map_err(|e| TranscriptError::Parse(e.to_string()))?;
    Ok(VideoInfo {
        video_id: video_id.to_string(),
        title: embed.title,
        channel_title: embed.author_name,
        published_at: None,
        duration: None,
        thumbnail_url: embed.thumbnail_url,
    })
}

/// Parse an ISO-8601 duration (`P[nD]T[nH][nM][nS]`); `None` if malformed.
///
/// # Errors
/// Returns an error if the duration pattern cannot be compiled.
pub fn parse_iso8601_duration(raw: &str) -> Result<Option<Duration>, TranscriptError> {
    let re = Regex::new(ISO_DURATION_PATTERN)?;
    let Some(caps) = re.captures(raw.trim()) else {
        return Ok(None);
    };

    let field = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    let secs = field(1) * 86_400 + field(2) * 3_600 + field(3) * 60 + field(4);
    Ok(Some(Duration::from_secs(secs)))
}

/// Format a duration as `H:MM:SS`.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}
