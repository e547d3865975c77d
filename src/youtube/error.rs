//! Error types for transcript retrieval.

use thiserror::Error;

/// Errors that can occur while locating or downloading a transcript.
#[derive(Debug, Error)]
pub enum TranscriptError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// HTTP client configuration error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Upstream endpoint answered with a non-success status.
    #[error("upstream endpoint returned status {0}")]
    HttpStatus(u16),

    /// No video id could be found in the locator.
    #[error("no YouTube video id found in: {0}")]
    VideoIdNotFound(String),

    /// No caption track exists for any of the requested languages.
    #[error("no transcript for video {video_id} (tried: {tried})")]
    NoTranscript {
        /// Video the lookup was for.
        video_id: String,
        /// Languages attempted, in order.
        tried: String,
    },

    /// Caption track exists but holds no text.
    #[error("transcript for video {0} is empty")]
    EmptyTranscript(String),

    /// Video details lookup found no such video.
    #[error("video {0} was not found")]
    VideoNotFound(String),

    /// Caption markup or metadata could not be parsed.
    #[error("caption parsing error: {0}")]
    Parse(String),

    /// Regex error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl TranscriptError {
    /// Check if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::HttpRequest(_) => true,
            Self::HttpStatus(status) => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether the failure is caused by the caller's input rather than upstream.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::VideoIdNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(TranscriptError::HttpStatus(429).is_retryable());
        assert!(TranscriptError::HttpStatus(503).is_retryable());
        assert!(!TranscriptError::HttpStatus(404).is_retryable());
        assert!(!TranscriptError::VideoIdNotFound("x".to_string()).is_retryable());
        assert!(!TranscriptError::VideoNotFound("x".to_string()).is_retryable());
    }

    #[test]
    fn test_no_transcript_message() {
        let err = TranscriptError::NoTranscript {
            video_id: "dQw4w9WgXcQ".to_string(),
            tried: "en, ja, default".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no transcript for video dQw4w9WgXcQ (tried: en, ja, default)"
        );
    }
}
