//! Error responses for the HTTP API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::core::errors::SummarizeError;
use crate::youtube::TranscriptError;

/// A failed request: status code, error kind and message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    /// Reject malformed input with 400.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "invalid_request",
            message: message.into(),
        }
    }

    /// HTTP status sent to the client.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<TranscriptError> for ApiError {
    fn from(err: TranscriptError) -> Self {
        let (status, kind) = match &err {
            TranscriptError::VideoIdNotFound(_) => (StatusCode::BAD_REQUEST, "invalid_video"),
            TranscriptError::NoTranscript { .. }
            | TranscriptError::EmptyTranscript(_)
            | TranscriptError::VideoNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            _ => (StatusCode::BAD_GATEWAY, "upstream"),
        };
        tracing::warn!(error = %err, status = status.as_u16(), "Transcript request failed");
        Self {
            status,
            kind,
            message: format!("Transcript error: {err}"),
        }
    }
}

impl From<SummarizeError> for ApiError {
    fn from(err: SummarizeError) -> Self {
        let (status, kind) = match &err {
            SummarizeError::InvalidConfig(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            SummarizeError::InvalidMindMap(_) | SummarizeError::MindMapFailed { .. } => {
                (StatusCode::BAD_GATEWAY, "mindmap")
            }
            _ => (StatusCode::BAD_GATEWAY, "model"),
        };
        tracing::warn!(error = %err, status = status.as_u16(), "Pipeline request failed");
        Self {
            status,
            kind,
            message: format!("Pipeline error: {err}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({
            "error": self.message,
            "kind": self.kind,
        });
        (self.status, Json(payload)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_errors_map_to_status() {
        let missing = ApiError::from(TranscriptError::VideoNotFound("x".to_string()));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let bad_id = ApiError::from(TranscriptError::VideoIdNotFound("x".to_string()));
        assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);

        let upstream = ApiError::from(TranscriptError::HttpStatus(503));
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_pipeline_errors_map_to_status() {
        let config = ApiError::from(SummarizeError::InvalidConfig("bad".to_string()));
        assert_eq!(config.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let mindmap = ApiError::from(SummarizeError::MindMapFailed {
            attempts: 3,
            message: "429".to_string(),
        });
        assert_eq!(mindmap.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(mindmap.kind, "mindmap");
    }
}
