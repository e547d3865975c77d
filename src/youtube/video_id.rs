//! Video id extraction from `YouTube` locators.

use regex::Regex;
use url::Url;

use crate::youtube::error::TranscriptError;

/// Fallback pattern: an 11-character id after `v=` or a slash.
const LOOSE_ID_PATTERN: &str = r"(?:v=|/)([0-9A-Za-z_-]{11})";

/// Path prefixes that are followed by a video id.
const ID_PATH_PREFIXES: [&str; 4] = ["embed", "shorts", "live", "v"];

/// Extract the 11-character video id from a URL or bare id.
///
/// Recognises `watch?v=`, `youtu.be/`, `/embed/`, `/shorts/`, `/live/` and
/// `/v/` forms, then falls back to a loose pattern match.
///
/// # Errors
/// Returns [`TranscriptError::VideoIdNotFound`] if no id is present.
pub fn extract_video_id(locator: &str) -> Result<String, TranscriptError> {
    let locator = locator.trim();

    if is_video_id(locator) {
        return Ok(locator.to_string());
    }

    if let Some(id) = Url::parse(locator).ok().as_ref().and_then(id_from_url) {
        return Ok(id);
    }

    let re = Regex::new(LOOSE_ID_PATTERN)?;
    re.captures(locator)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| TranscriptError::VideoIdNotFound(locator.to_string()))
}

/// Whether `candidate` has the shape of a video id.
#[must_use]
pub fn is_video_id(candidate: &str) -> bool {
    candidate.len() == 11
        && candidate
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

fn id_from_url(url: &Url) -> Option<String> {
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");

    if host == "youtu.be" {
        return url
            .path_segments()?
            .next()
            .filter(|segment| is_video_id(segment))
            .map(String::from);
    }

    if !is_youtube_host(host) {
        return None;
    }

    let from_query = url
        .query_pairs()
        .find_map(|(key, value)| (key == "v" && is_video_id(&value)).then(|| value.into_owned()));
    if from_query.is_some() {
        return from_query;
    }

    let mut segments = url.path_segments()?;
    let prefix = segments.next()?;
    if ID_PATH_PREFIXES.contains(&prefix) {
        return segments
            .next()
            .filter(|segment| is_video_id(segment))
            .map(String::from);
    }

    None
}

/// `youtube.com`, `youtube-nocookie.com` or one of their subdomains.
fn is_youtube_host(host: &str) -> bool {
    ["youtube.com", "youtube-nocookie.com"].iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}
