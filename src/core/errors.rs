//! Error types for the summarization pipeline.

use thiserror::Error;

/// Boxed error returned by pluggable chunk summarizers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Summarization pipeline error type.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A single chunk could not be summarized; the whole run is aborted.
    #[error("chunk {index} failed to summarize: {message}")]
    ChunkFailed {
        /// Position of the failing chunk in transcript order.
        index: usize,
        /// Description of the underlying failure.
        message: String,
    },
    /// A summarization worker task panicked or was cancelled.
    #[error("summarization worker for chunk {index} died: {message}")]
    WorkerPanicked {
        /// Position of the chunk the worker was handling.
        index: usize,
        /// Join error description.
        message: String,
    },
    /// A model answer did not contain a usable Mermaid diagram.
    #[error("invalid mind map: {0}")]
    InvalidMindMap(String),
    /// Mind map generation gave up after repeated failures.
    #[error("mind map generation failed after {attempts} attempt(s): {message}")]
    MindMapFailed {
        /// Number of backend calls made.
        attempts: u32,
        /// Description of the last failure.
        message: String,
    },
    /// Sentence terminator pattern could not be compiled.
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
    /// HTTP client error from Rig.
    #[error("http client error: {0}")]
    HttpClient(#[from] rig::http_client::Error),
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl SummarizeError {
    /// Index of the chunk that caused the failure, if any.
    #[must_use]
    pub const fn chunk_index(&self) -> Option<usize> {
        match self {
            Self::ChunkFailed { index, .. } | Self::WorkerPanicked { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Convenience result alias for pipeline operations.
pub type SummarizeResult<T> = Result<T, SummarizeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_failure_message() {
        let err = SummarizeError::ChunkFailed {
            index: 3,
            message: "backend offline".to_string(),
        };
        assert_eq!(err.to_string(), "chunk 3 failed to summarize: backend offline");
        assert_eq!(err.chunk_index(), Some(3));
    }

    #[test]
    fn test_config_error_has_no_chunk() {
        let err = SummarizeError::InvalidConfig("chunk_size must be > 0".to_string());
        assert_eq!(err.chunk_index(), None);
    }

    #[test]
    fn test_mind_map_failure_message() {
        let err = SummarizeError::MindMapFailed {
            attempts: 3,
            message: "429 Too Many Requests".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "mind map generation failed after 3 attempt(s): 429 Too Many Requests"
        );
        assert_eq!(err.chunk_index(), None);
    }
}
