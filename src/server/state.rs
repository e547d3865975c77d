//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::core::config::AppConfig;
use crate::core::errors::BoxError;
use crate::summarizer::{MindMapGenerator, TranscriptProofreader, TranscriptSummarizer};
use crate::youtube::{TimedTextSource, TranscriptSource};

use super::cache::SummaryCache;

/// Shared application state.
pub struct AppState {
    /// Summarization pipeline.
    pub summarizer: TranscriptSummarizer,
    /// Chunked proofreading pipeline.
    pub proofreader: TranscriptProofreader,
    /// Mind map generator.
    pub mindmapper: MindMapGenerator,
    /// Caption source for URL requests.
    pub transcripts: Arc<dyn TranscriptSource>,
    /// Preferred caption languages.
    pub languages: Vec<String>,
    /// Finished summaries per video id.
    pub cache: SummaryCache,
}

impl AppState {
    /// Create state from explicit parts.
    #[must_use]
    pub fn new(
        summarizer: TranscriptSummarizer,
        proofreader: TranscriptProofreader,
        mindmapper: MindMapGenerator,
        transcripts: Arc<dyn TranscriptSource>,
        config: &AppConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            summarizer,
            proofreader,
            mindmapper,
            transcripts,
            languages: config.transcript.languages.clone(),
            cache: SummaryCache::new(&config.server),
        })
    }

    /// Create state with the configured backend and the timedtext caption source.
    ///
    /// # Errors
    /// Returns an error if a pipeline or the HTTP client cannot be created.
    pub fn from_config(config: &AppConfig) -> Result<Arc<Self>, BoxError> {
        let summarizer = TranscriptSummarizer::from_app_config(config)
            .map_err(|e| format!("Failed to create summarizer: {e}"))?;
        let proofreader = TranscriptProofreader::from_app_config(config)
            .map_err(|e| format!("Failed to create proofreader: {e}"))?;
        let mindmapper = MindMapGenerator::from_app_config(config)
            .map_err(|e| format!("Failed to create mind map generator: {e}"))?;
        let transcripts = TimedTextSource::new(&config.transcript)
            .map_err(|e| format!("Failed to create caption client: {e}"))?;

        Ok(Self::new(
            summarizer,
            proofreader,
            mindmapper,
            Arc::new(transcripts),
            config,
        ))
    }
}
