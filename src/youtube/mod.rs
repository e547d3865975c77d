//! `YouTube` transcript retrieval.
//!
//! Resolves a video locator to its id and fetches the caption text that
//! feeds the summarization pipeline, plus the video's details.

pub mod error;
pub mod transcript;
pub mod video_id;
pub mod video_info;

pub use error::TranscriptError;
pub use transcript::{StaticTranscriptSource, TimedTextSource, Transcript, TranscriptSource, parse_timed_text};
pub use video_id::{extract_video_id, is_video_id};
pub use video_info::{VideoInfo, format_duration, parse_iso8601_duration};

/// Resolve `locator` to a video id and fetch its transcript from `source`.
///
/// # Errors
/// Returns an error if no video id is found, no track exists, or the
/// track is empty.
pub async fn fetch_transcript(
    source: &dyn TranscriptSource,
    locator: &str,
    languages: &[String],
) -> Result<Transcript, TranscriptError> {
    let video_id = extract_video_id(locator)?;
    let transcript = source.fetch(&video_id, languages).await?;

    if transcript.text.trim().is_empty() {
        return Err(TranscriptError::EmptyTranscript(video_id));
    }

    tracing::info!(
        video_id = %transcript.video_id,
        language = transcript.language.as_deref().unwrap_or("default"),
        chars = transcript.text.chars().count(),
        "Transcript fetched"
    );
    Ok(transcript)
}

/// Resolve `locator` to a video id and look up its details in `source`.
///
/// # Errors
/// Returns an error if no video id is found or the video does not exist.
pub async fn fetch_video_info(
    source: &dyn TranscriptSource,
    locator: &str,
) -> Result<VideoInfo, TranscriptError> {
    let video_id = extract_video_id(locator)?;
    let info = source.video_info(&video_id).await?;
    tracing::info!(video_id = %info.video_id, title = %info.title, "Video details fetched");
    Ok(info)
}
