//! Chunked proofreading of raw captions.
//!
//! Captions are split into sentence-aligned chunks without overlap, each
//! chunk is corrected by one backend call and the corrected chunks are
//! joined as paragraphs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::config::{AppConfig, ProofreadConfig, SummaryBackend};
use crate::core::errors::{SummarizeError, SummarizeResult};
use crate::summarizer::backend::{ChunkSummarizer, FnSummarizer};
use crate::summarizer::chunker::{Chunk, SentenceSplitter, chunk_transcript};
use crate::summarizer::dispatch::summarize_chunks;
use crate::summarizer::llm::{LlmChunkSummarizer, LlmTask};

/// Separator placed between corrected chunks.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Outcome of one proofreading run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofreadReport {
    /// Name of the backend that corrected the chunks.
    pub backend: String,
    /// Number of chunks sent to the backend.
    pub chunk_count: usize,
    /// Corrected text, one paragraph per chunk.
    pub text: String,
}

/// Corrects transcripts chunk by chunk with an injected editor.
pub struct TranscriptProofreader {
    config: ProofreadConfig,
    splitter: SentenceSplitter,
    editor: Arc<dyn ChunkSummarizer>,
}

impl TranscriptProofreader {
    /// Create a proofreader around `editor`.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(
        config: ProofreadConfig,
        splitter: SentenceSplitter,
        editor: Arc<dyn ChunkSummarizer>,
    ) -> SummarizeResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            splitter,
            editor,
        })
    }

    /// Create a proofreader whose editor returns each chunk unchanged.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn passthrough(config: ProofreadConfig, splitter: SentenceSplitter) -> SummarizeResult<Self> {
        let editor = FnSummarizer::new("passthrough", |chunk: &str| {
            Ok::<_, String>(chunk.to_string())
        });
        Self::new(config, splitter, Arc::new(editor))
    }

    /// Create a proofreader with the backend selected in `config`.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the LLM client
    /// cannot be built.
    pub fn from_app_config(config: &AppConfig) -> SummarizeResult<Self> {
        let splitter = SentenceSplitter::new(&config.summarizer.sentence_terminators)?;
        match config.backend {
            SummaryBackend::Placeholder => Self::passthrough(config.proofread, splitter),
            SummaryBackend::Llm => {
                let editor = LlmChunkSummarizer::for_task(&config.llm, LlmTask::Proofread)?;
                Self::new(config.proofread, splitter, Arc::new(editor))
            }
        }
    }

    /// Name of the injected editor.
    #[must_use]
    pub fn backend_name(&self) -> &str {
        self.editor.name()
    }

    /// Split captions into sentence-aligned chunks of at most `chunk_size`
    /// characters, except for single oversized sentences.
    #[must_use]
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        chunk_transcript(&self.splitter, text, self.config.chunk_size, 0)
    }

    /// Proofread `text`.
    ///
    /// # Errors
    /// Returns [`SummarizeError::ChunkFailed`] if a backend call fails or
    /// returns only whitespace; no partial text is produced.
    pub async fn proofread(&self, text: &str) -> SummarizeResult<ProofreadReport> {
        let chunks = self.chunk(text);
        let chunk_count = chunks.len();
        info!(
            chunk_count,
            chars = text.chars().count(),
            backend = self.editor.name(),
            "Proofreading transcript"
        );

        let edited = summarize_chunks(
            chunks,
            Arc::clone(&self.editor),
            self.config.effective_concurrency(),
        )
        .await?;

        let mut paragraphs = Vec::with_capacity(edited.len());
        for piece in edited {
            let paragraph = piece.text.trim();
            if paragraph.is_empty() {
                return Err(SummarizeError::ChunkFailed {
                    index: piece.index,
                    message: "empty proofreading result".to_string(),
                });
            }
            paragraphs.push(paragraph.to_string());
        }

        info!(chunk_count, "Transcript proofread");
        Ok(ProofreadReport {
            backend: self.editor.name().to_string(),
            chunk_count,
            text: paragraphs.join(PARAGRAPH_SEPARATOR),
        })
    }
}
