//! Caption track retrieval with language fallback.

use std::collections::HashMap;

use async_trait::async_trait;
use regex::{Captures, Regex};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use crate::core::config::TranscriptConfig;
use crate::youtube::error::TranscriptError;
use crate::youtube::video_info::{VideoInfo, info_from_data_api, info_from_oembed};

/// Label used for the track fetched without a language code.
const DEFAULT_TRACK: &str = "default";

/// Plain transcript text of one video.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    /// Video the captions belong to.
    pub video_id: String,
    /// Language of the selected track, if known.
    pub language: Option<String>,
    /// Caption entries joined with single spaces.
    pub text: String,
}

/// Anything that can produce a transcript for a video id.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the transcript, trying `languages` in order before any default track.
    ///
    /// # Errors
    /// Returns an error if no usable track exists or retrieval fails.
    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Transcript, TranscriptError>;

    /// Look up title, channel and other details of a video.
    ///
    /// # Errors
    /// Returns [`TranscriptError::VideoNotFound`] if the video does not exist.
    async fn video_info(&self, video_id: &str) -> Result<VideoInfo, TranscriptError>;
}

/// Fetches caption tracks from the `YouTube` timedtext endpoint and video
/// details from the Data API or `oEmbed`.
pub struct TimedTextSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    data_api_url: String,
    oembed_url: String,
}

impl TimedTextSource {
    /// Create a source with the given configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &TranscriptConfig) -> Result<Self, TranscriptError> {
        let client = Self::build_client(config)?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            data_api_url: config.data_api_url.clone(),
            oembed_url: config.oembed_url.clone(),
        })
    }

    fn build_client(config: &TranscriptConfig) -> Result<reqwest::Client, TranscriptError> {
        use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            ),
        );
        if let Ok(lang) = HeaderValue::from_str(&accept_language(&config.languages)) {
            headers.insert(ACCEPT_LANGUAGE, lang);
        }

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .gzip(true)
            .build()
            .map_err(|e| TranscriptError::HttpClient(e.to_string()))
    }

    fn track_url(&self, video_id: &str, language: Option<&str>) -> String {
        let mut url = format!("{}?v={}", self.base_url, urlencoding::encode(video_id));
        if let Some(lang) = language {
            url.push_str("&lang=");
            url.push_str(&urlencoding::encode(lang));
        }
        url
    }

    fn data_api_request_url(&self, video_id: &str, api_key: &str) -> String {
        format!(
            "{}?part=snippet%2CcontentDetails&id={}&key={}",
            self.data_api_url,
            urlencoding::encode(video_id),
            urlencoding::encode(api_key)
        )
    }

    fn oembed_request_url(&self, video_id: &str) -> String {
        let watch = format!("https://www.youtube.com/watch?v={video_id}");
        format!(
            "{}?url={}&format=json",
            self.oembed_url,
            urlencoding::encode(&watch)
        )
    }

    /// GET `url` and return the body; missing or private videos map to
    /// [`TranscriptError::VideoNotFound`].
    async fn fetch_details(&self, url: &str, video_id: &str) -> Result<String, TranscriptError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if matches!(status.as_u16(), 401 | 403 | 404) {
            return Err(TranscriptError::VideoNotFound(video_id.to_string()));
        }
        if !status.is_success() {
            return Err(TranscriptError::HttpStatus(status.as_u16()));
        }

        Ok(response.text().await?)
    }

    /// Download one track; `Ok(None)` when the track does not exist.
    async fn fetch_track(
        &self,
        video_id: &str,
        language: Option<&str>,
    ) -> Result<Option<String>, TranscriptError> {
        let url = self.track_url(video_id, language);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(TranscriptError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await?;
        let entries = parse_timed_text(&body)?;
        if entries.is_empty() {
            return Ok(None);
        }
        Ok(Some(entries.join(" ")))
    }
}

#[async_trait]
impl TranscriptSource for TimedTextSource {
    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Transcript, TranscriptError> {
        let attempts = languages
            .iter()
            .map(|lang| Some(lang.as_str()))
            .chain(std::iter::once(None));

        for language in attempts {
            tracing::debug!(video_id, language = language.unwrap_or(DEFAULT_TRACK), "Trying caption track");
            match self.fetch_track(video_id, language).await {
                Ok(Some(text)) => {
                    return Ok(Transcript {
                        video_id: video_id.to_string(),
                        language: language.map(String::from),
                        text,
                    });
                }
                Ok(None) => {}
                Err(err) if err.is_retryable() => return Err(err),
                Err(err) => {
                    tracing::debug!(video_id, error = %err, "Caption track unavailable");
                }
            }
        }

        Err(TranscriptError::NoTranscript {
            video_id: video_id.to_string(),
            tried: tried_list(languages),
        })
    }

    async fn video_info(&self, video_id: &str) -> Result<VideoInfo, TranscriptError> {
        if let Some(api_key) = self.api_key.as_deref() {
            tracing::debug!(video_id, "Fetching video details from the Data API");
            let body = self
                .fetch_details(&self.data_api_request_url(video_id, api_key), video_id)
                .await?;
            return info_from_data_api(video_id, &body);
        }

        tracing::debug!(video_id, "Fetching video details from oEmbed");
        let body = self
            .fetch_details(&self.oembed_request_url(video_id), video_id)
            .await?;
        info_from_oembed(video_id, &body)
    }
}

/// In-memory transcripts and video details keyed by video id.
#[derive(Clone, Debug, Default)]
pub struct StaticTranscriptSource {
    tracks: HashMap<String, Vec<(Option<String>, String)>>,
    infos: HashMap<String, VideoInfo>,
}

impl StaticTranscriptSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a caption track.
    #[must_use]
    pub fn with_track(
        mut self,
        video_id: impl Into<String>,
        language: Option<&str>,
        text: impl Into<String>,
    ) -> Self {
        self.tracks
            .entry(video_id.into())
            .or_default()
            .push((language.map(String::from), text.into()));
        self
    }

    /// Register the details of a video.
    #[must_use]
    pub fn with_info(mut self, info: VideoInfo) -> Self {
        self.infos.insert(info.video_id.clone(), info);
        self
    }
}

#[async_trait]
impl TranscriptSource for StaticTranscriptSource {
    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Transcript, TranscriptError> {
        let tracks = self.tracks.get(video_id).map(Vec::as_slice).unwrap_or_default();

        let preferred = languages.iter().find_map(|wanted| {
            tracks
                .iter()
                .find(|(lang, _)| lang.as_deref() == Some(wanted.as_str()))
        });
        let (language, text) = preferred
            .or_else(|| tracks.first())
            .ok_or_else(|| TranscriptError::NoTranscript {
                video_id: video_id.to_string(),
                tried: tried_list(languages),
            })?;

        if text.trim().is_empty() {
            return Err(TranscriptError::EmptyTranscript(video_id.to_string()));
        }

        Ok(Transcript {
            video_id: video_id.to_string(),
            language: language.clone(),
            text: text.clone(),
        })
    }

    async fn video_info(&self, video_id: &str) -> Result<VideoInfo, TranscriptError> {
        self.infos
            .get(video_id)
            .cloned()
            .ok_or_else(|| TranscriptError::VideoNotFound(video_id.to_string()))
    }
}

/// Extract caption entries from timedtext markup (`<text>` or srv3 `<p>` nodes).
///
/// # Errors
/// Returns an error if the selector or entity pattern cannot be built.
pub fn parse_timed_text(markup: &str) -> Result<Vec<String>, TranscriptError> {
    let selector =
        Selector::parse("text, p").map_err(|e| TranscriptError::Parse(format!("{e:?}")))?;
    let entity = Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|amp|lt|gt|quot|apos);")?;
    let fragment = Html::parse_fragment(markup);

    let entries = fragment
        .select(&selector)
        .map(|node| node.text().collect::<String>())
        .map(|raw| decode_entities(&entity, &raw))
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|text| !text.is_empty())
        .collect();

    Ok(entries)
}

/// Decode the entities left over from double-escaped caption text.
fn decode_entities(pattern: &Regex, text: &str) -> String {
    pattern
        .replace_all(text, |caps: &Captures<'_>| {
            let name = &caps[1];
            let decoded = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => name
                    .strip_prefix("#x")
                    .or_else(|| name.strip_prefix("#X"))
                    .map_or_else(
                        || name.trim_start_matches('#').parse::<u32>().ok(),
                        |hex| u32::from_str_radix(hex, 16).ok(),
                    )
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn accept_language(languages: &[String]) -> String {
    if languages.is_empty() {
        return "en".to_string();
    }
    languages.join(",")
}

fn tried_list(languages: &[String]) -> String {
    languages
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(DEFAULT_TRACK))
        .collect::<Vec<_>>()
        .join(", ")
}
