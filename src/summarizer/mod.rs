//! Transcript summarization pipeline.
//!
//! chunk → parallel summarize → combine → trim:
//! - Sentence-aware chunking with a small overlap between chunks
//! - Bounded parallel summarization, results kept in chunk order
//! - Newline join of chunk summaries
//! - Character-count trim to a fraction of the original length
//!
//! The same chunk backends also drive proofreading and mind map drafting.

pub mod backend;
pub mod chunker;
pub mod combine;
pub mod dispatch;
pub mod llm;
pub mod mindmap;
pub mod proofread;

pub use backend::{ChunkSummarizer, FnSummarizer, PrefixSummarizer};
pub use chunker::{Chunk, SentenceSplitter, chunk_transcript};
pub use combine::{combine_summaries, target_length, trim_to_target};
pub use dispatch::{ChunkSummary, summarize_chunks};
pub use llm::{LlmChunkSummarizer, LlmTask};
pub use mindmap::{MindMap, MindMapGenerator, OutlineMindMapper, extract_mermaid};
pub use proofread::{ProofreadReport, TranscriptProofreader};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::core::config::{AppConfig, SummarizerConfig, SummaryBackend};
use crate::core::errors::SummarizeResult;

/// Outcome of one pipeline run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SummaryReport {
    /// Run identifier, also used in logs.
    pub id: Uuid,
    /// When the run finished.
    pub created_at: DateTime<Utc>,
    /// Name of the chunk summarizer that produced the summaries.
    pub backend: String,
    /// Transcript length in characters.
    pub original_chars: usize,
    /// Length ceiling applied to the final summary.
    pub target_chars: usize,
    /// Number of chunks the transcript was split into.
    pub chunk_count: usize,
    /// Per-chunk summaries in transcript order.
    pub chunk_summaries: Vec<ChunkSummary>,
    /// Final trimmed summary.
    pub summary: String,
}

/// Summarizes transcripts with an injected chunk summarizer.
pub struct TranscriptSummarizer {
    config: SummarizerConfig,
    splitter: SentenceSplitter,
    summarizer: Arc<dyn ChunkSummarizer>,
}

impl TranscriptSummarizer {
    /// Create a pipeline around `summarizer`.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(config: SummarizerConfig, summarizer: Arc<dyn ChunkSummarizer>) -> SummarizeResult<Self> {
        config.validate()?;
        let splitter = SentenceSplitter::new(&config.sentence_terminators)?;
        Ok(Self {
            config,
            splitter,
            summarizer,
        })
    }

    /// Create a pipeline using the placeholder prefix summarizer.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn placeholder(config: SummarizerConfig) -> SummarizeResult<Self> {
        let summarizer = PrefixSummarizer::new(
            config.placeholder_label.clone(),
            config.placeholder_prefix_chars,
        );
        Self::new(config, Arc::new(summarizer))
    }

    /// Create a pipeline with the backend selected in `config`.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the LLM client
    /// cannot be built.
    pub fn from_app_config(config: &AppConfig) -> SummarizeResult<Self> {
        match config.backend {
            SummaryBackend::Placeholder => Self::placeholder(config.summarizer.clone()),
            SummaryBackend::Llm => {
                let llm = LlmChunkSummarizer::new(&config.llm)?;
                Self::new(config.summarizer.clone(), Arc::new(llm))
            }
        }
    }

    /// Pipeline settings.
    #[must_use]
    pub const fn config(&self) -> &SummarizerConfig {
        &self.config
    }

    /// Name of the injected chunk summarizer.
    #[must_use]
    pub fn backend_name(&self) -> &str {
        self.summarizer.name()
    }

    /// Split a transcript into overlapping, sentence-aligned chunks.
    #[must_use]
    pub fn chunk(&self, transcript: &str) -> Vec<Chunk> {
        chunk_transcript(
            &self.splitter,
            transcript,
            self.config.chunk_size,
            self.config.overlap_size,
        )
    }

    /// Summarize a transcript and return the final summary only.
    ///
    /// # Errors
    /// Returns an error if any chunk fails to summarize.
    pub async fn summarize(&self, transcript: &str) -> SummarizeResult<String> {
        Ok(self.run(transcript).await?.summary)
    }

    /// Summarize a transcript and return the full report.
    ///
    /// # Errors
    /// Returns an error if any chunk fails to summarize; no partial output
    /// is produced.
    pub async fn run(&self, transcript: &str) -> SummarizeResult<SummaryReport> {
        let id = Uuid::new_v4();
        let original_chars = transcript.chars().count();
        let target_chars = target_length(original_chars, self.config.target_ratio);

        let chunks = self.chunk(transcript);
        let chunk_count = chunks.len();
        info!(
            %id,
            original_chars,
            target_chars,
            chunk_count,
            backend = self.summarizer.name(),
            "Summarizing transcript"
        );

        let chunk_summaries = summarize_chunks(
            chunks,
            Arc::clone(&self.summarizer),
            self.config.effective_concurrency(),
        )
        .await?;

        let combined = combine_summaries(&chunk_summaries);
        let summary = trim_to_target(&combined, target_chars);
        info!(%id, summary_chars = summary.chars().count(), "Transcript summarized");

        Ok(SummaryReport {
            id,
            created_at: Utc::now(),
            backend: self.summarizer.name().to_string(),
            original_chars,
            target_chars,
            chunk_count,
            chunk_summaries,
            summary,
        })
    }
}
