//! HTTP route handlers for the summarizer API.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::summarizer::{MindMap, ProofreadReport, SummaryReport};
use crate::youtube::{Transcript, VideoInfo, extract_video_id, fetch_transcript, fetch_video_info};

use super::error::ApiError;
use super::state::AppState;

const TRANSCRIPT_OR_URL: &str = "Provide exactly one of `transcript` or `url`";

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/summarize", post(summarize))
        .route("/api/proofread", post(proofread))
        .route("/api/mindmap", post(mindmap))
        .route("/api/transcript", get(transcript))
        .route("/api/video", get(video))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "insightmap",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.summarizer.backend_name(),
        "proofread_backend": state.proofreader.backend_name(),
        "mindmap_backend": state.mindmapper.backend_name(),
    }))
}

/// Summarize request: either raw transcript text or a video URL.
#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    /// Transcript text to summarize directly.
    pub transcript: Option<String>,
    /// `YouTube` URL or video id to fetch captions for.
    pub url: Option<String>,
}

/// Summarize response.
#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    /// Video the transcript came from, for URL requests.
    pub video_id: Option<String>,
    /// Whether the report was served from cache.
    pub cached: bool,
    /// Pipeline output.
    #[serde(flatten)]
    pub report: SummaryReport,
}

/// Handle summarize requests.
async fn summarize(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    match (request.transcript, request.url) {
        (Some(text), None) => {
            let report = state.summarizer.run(&text).await?;
            Ok(Json(SummarizeResponse {
                video_id: None,
                cached: false,
                report,
            }))
        }
        (None, Some(url)) => summarize_video(&state, &url).await.map(Json),
        _ => Err(ApiError::bad_request(TRANSCRIPT_OR_URL)),
    }
}

async fn summarize_video(state: &AppState, url: &str) -> Result<SummarizeResponse, ApiError> {
    let video_id = extract_video_id(url)?;

    if let Some(report) = state.cache.get(&video_id) {
        tracing::debug!(%video_id, "Serving cached summary");
        return Ok(SummarizeResponse {
            video_id: Some(video_id),
            cached: true,
            report,
        });
    }

    let transcript = fetch_transcript(state.transcripts.as_ref(), &video_id, &state.languages).await?;
    let report = state.summarizer.run(&transcript.text).await?;

    state.cache.insert(&video_id, &report);
    Ok(SummarizeResponse {
        video_id: Some(video_id),
        cached: false,
        report,
    })
}

/// Proofread request: either raw transcript text or a video URL.
#[derive(Debug, Deserialize)]
pub struct ProofreadRequest {
    /// Transcript text to correct directly.
    pub transcript: Option<String>,
    /// `YouTube` URL or video id to fetch captions for.
    pub url: Option<String>,
}

/// Proofread response.
#[derive(Debug, Serialize)]
pub struct ProofreadResponse {
    /// Video the transcript came from, for URL requests.
    pub video_id: Option<String>,
    /// Corrected text and run details.
    #[serde(flatten)]
    pub report: ProofreadReport,
}

/// Handle proofread requests.
async fn proofread(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProofreadRequest>,
) -> Result<Json<ProofreadResponse>, ApiError> {
    let (video_id, text) = match (request.transcript, request.url) {
        (Some(text), None) => (None, text),
        (None, Some(url)) => {
            let fetched = fetch_transcript(state.transcripts.as_ref(), &url, &state.languages).await?;
            (Some(fetched.video_id), fetched.text)
        }
        _ => return Err(ApiError::bad_request(TRANSCRIPT_OR_URL)),
    };

    let report = state.proofreader.proofread(&text).await?;
    Ok(Json(ProofreadResponse { video_id, report }))
}

/// Mind map request: a finished summary, transcript text or a video URL.
#[derive(Debug, Deserialize)]
pub struct MindMapRequest {
    /// Summary to map as is.
    pub summary: Option<String>,
    /// Transcript text, summarized first.
    pub transcript: Option<String>,
    /// `YouTube` URL or video id, fetched and summarized first.
    pub url: Option<String>,
}

/// Mind map response.
#[derive(Debug, Serialize)]
pub struct MindMapResponse {
    /// Video the summary came from, for URL requests.
    pub video_id: Option<String>,
    /// Summary the diagram was drawn from.
    pub summary: String,
    /// Generated diagram.
    #[serde(flatten)]
    pub mindmap: MindMap,
}

/// Handle mind map requests.
async fn mindmap(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MindMapRequest>,
) -> Result<Json<MindMapResponse>, ApiError> {
    let (video_id, summary) = match (request.summary, request.transcript, request.url) {
        (Some(summary), None, None) => (None, summary),
        (None, Some(text), None) => (None, state.summarizer.summarize(&text).await?),
        (None, None, Some(url)) => {
            let summarized = summarize_video(&state, &url).await?;
            (summarized.video_id, summarized.report.summary)
        }
        _ => {
            return Err(ApiError::bad_request(
                "Provide exactly one of `summary`, `transcript` or `url`",
            ));
        }
    };

    if summary.trim().is_empty() {
        return Err(ApiError::bad_request("Nothing to map: the summary is empty"));
    }

    let diagram = state.mindmapper.generate(&summary).await?;
    Ok(Json(MindMapResponse {
        video_id,
        summary,
        mindmap: diagram,
    }))
}

/// Video lookup query.
#[derive(Debug, Deserialize)]
pub struct VideoQuery {
    /// `YouTube` URL or video id.
    pub url: String,
}

/// Handle transcript lookups.
async fn transcript(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VideoQuery>,
) -> Result<Json<Transcript>, ApiError> {
    let fetched = fetch_transcript(state.transcripts.as_ref(), &query.url, &state.languages).await?;
    Ok(Json(fetched))
}

/// Handle video detail lookups.
async fn video(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VideoQuery>,
) -> Result<Json<VideoInfo>, ApiError> {
    let info = fetch_video_info(state.transcripts.as_ref(), &query.url).await?;
    Ok(Json(info))
}
