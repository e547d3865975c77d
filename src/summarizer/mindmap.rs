//! Mermaid mind maps drawn from a summary.
//!
//! A single backend call drafts the diagram. Rate-limited calls are retried
//! with exponential backoff; any other failure, or an answer that is not a
//! `graph TD` diagram, ends the run.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::config::{AppConfig, MindMapConfig, SummaryBackend};
use crate::core::errors::{BoxError, SummarizeError, SummarizeResult};
use crate::summarizer::backend::ChunkSummarizer;
use crate::summarizer::chunker::SentenceSplitter;
use crate::summarizer::llm::{LlmChunkSummarizer, LlmTask};

/// First line every accepted diagram starts with.
pub const MERMAID_HEADER: &str = "graph TD";

/// Branches drawn by the outline mapper.
const MAX_OUTLINE_BRANCHES: usize = 8;

/// Characters kept per outline label.
const MAX_LABEL_CHARS: usize = 40;

/// Characters that would break a Mermaid node label.
const LABEL_RESERVED: [char; 8] = ['[', ']', '(', ')', '{', '}', '"', '|'];

/// A generated diagram.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMap {
    /// Name of the backend that drafted the diagram.
    pub backend: String,
    /// Backend calls made, retries included.
    pub attempts: u32,
    /// Mermaid source without code fences.
    pub mermaid: String,
}

/// Drafts mind maps with an injected backend.
pub struct MindMapGenerator {
    backend: Arc<dyn ChunkSummarizer>,
    config: MindMapConfig,
}

impl MindMapGenerator {
    /// Create a generator around `backend`.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(backend: Arc<dyn ChunkSummarizer>, config: MindMapConfig) -> SummarizeResult<Self> {
        config.validate()?;
        Ok(Self { backend, config })
    }

    /// Create a generator with the backend selected in `config`.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the LLM client
    /// cannot be built.
    pub fn from_app_config(config: &AppConfig) -> SummarizeResult<Self> {
        let backend: Arc<dyn ChunkSummarizer> = match config.backend {
            SummaryBackend::Placeholder => Arc::new(OutlineMindMapper::new(SentenceSplitter::new(
                &config.summarizer.sentence_terminators,
            )?)),
            SummaryBackend::Llm => Arc::new(LlmChunkSummarizer::for_task(
                &config.llm,
                LlmTask::MindMap,
            )?),
        };
        Self::new(backend, config.mindmap)
    }

    /// Name of the injected backend.
    #[must_use]
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Wait before retry number `retry` (0-based): `base * 2^retry`.
    #[must_use]
    pub const fn retry_delay(&self, retry: u32) -> Duration {
        self.config
            .retry_base_delay
            .saturating_mul(2u32.saturating_pow(retry))
    }

    /// Draft a mind map for `text`.
    ///
    /// # Errors
    /// Returns [`SummarizeError::InvalidMindMap`] if the input is blank or
    /// the answer is not a Mermaid `graph TD` diagram, and
    /// [`SummarizeError::MindMapFailed`] once the backend keeps failing.
    pub async fn generate(&self, text: &str) -> SummarizeResult<MindMap> {
        if text.trim().is_empty() {
            return Err(SummarizeError::InvalidMindMap(
                "nothing to map: input text is empty".to_string(),
            ));
        }

        let max_attempts = self.config.max_attempts;
        let mut attempts = 0;
        loop {
            attempts += 1;
            info!(attempts, max_attempts, backend = self.backend.name(), "Generating mind map");

            let message = match self.backend.summarize_chunk(text).await {
                Ok(raw) => {
                    let mermaid = extract_mermaid(&raw)?;
                    return Ok(MindMap {
                        backend: self.backend.name().to_string(),
                        attempts,
                        mermaid,
                    });
                }
                Err(err) => err.to_string(),
            };

            if !is_rate_limited(&message) || attempts >= max_attempts {
                warn!(attempts, %message, "Mind map generation failed");
                return Err(SummarizeError::MindMapFailed { attempts, message });
            }

            let delay = self.retry_delay(attempts - 1);
            warn!(attempts, ?delay, "Mind map backend rate limited, retrying");
            tokio::time::sleep(delay).await;
        }
    }
}

/// Whether a backend error reports rate limiting.
fn is_rate_limited(message: &str) -> bool {
    message.contains("429") || message.to_ascii_lowercase().contains("rate limit")
}

/// Strip code fences from a model answer and check the diagram header.
///
/// # Errors
/// Returns [`SummarizeError::InvalidMindMap`] if the answer does not start
/// with `graph TD` once fences are removed.
pub fn extract_mermaid(raw: &str) -> SummarizeResult<String> {
    let trimmed = raw.trim();
    let unfenced = trimmed
        .strip_prefix("```mermaid")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let body = unfenced.strip_suffix("```").unwrap_or(unfenced).trim();

    if !body.starts_with(MERMAID_HEADER) {
        let head: String = body.chars().take(40).collect();
        return Err(SummarizeError::InvalidMindMap(format!(
            "expected a '{MERMAID_HEADER}' diagram, got '{head}'"
        )));
    }
    Ok(body.to_string())
}

/// Placeholder mapper: one root node with the first points of the text as
/// branches. Makes no model call.
#[derive(Clone, Debug)]
pub struct OutlineMindMapper {
    splitter: SentenceSplitter,
}

impl OutlineMindMapper {
    /// Create an outline mapper that falls back to `splitter` for prose.
    #[must_use]
    pub const fn new(splitter: SentenceSplitter) -> Self {
        Self { splitter }
    }

    fn points<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let lines: Vec<&str> = text
            .lines()
            .map(|line| line.trim().trim_start_matches(['-', '*', '•']).trim())
            .filter(|line| !line.is_empty())
            .collect();
        if lines.len() > 1 {
            lines
        } else {
            self.splitter.split(text)
        }
    }

    fn render(&self, text: &str) -> String {
        let mut lines = vec![MERMAID_HEADER.to_string(), "    A[Summary]".to_string()];
        let labels = self
            .points(text)
            .into_iter()
            .map(node_label)
            .filter(|label| !label.is_empty())
            .take(MAX_OUTLINE_BRANCHES);
        for (i, label) in labels.enumerate() {
            lines.push(format!("    A --> N{}[{label}]", i + 1));
        }
        lines.join("\n")
    }
}

#[async_trait]
impl ChunkSummarizer for OutlineMindMapper {
    async fn summarize_chunk(&self, chunk: &str) -> Result<String, BoxError> {
        Ok(self.render(chunk))
    }

    fn name(&self) -> &'static str {
        "outline"
    }
}

/// Short label safe to put between square brackets.
fn node_label(point: &str) -> String {
    let cleaned: String = point
        .chars()
        .map(|c| if LABEL_RESERVED.contains(&c) { ' ' } else { c })
        .take(MAX_LABEL_CHARS)
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::core::config::DEFAULT_TERMINATORS;

    fn fast_retries(max_attempts: u32) -> MindMapConfig {
        MindMapConfig {
            max_attempts,
            retry_base_delay: Duration::from_millis(1),
        }
    }

    /// Fails with the given message until `succeed_after` calls were made.
    struct FlakyBackend {
        calls: AtomicU32,
        succeed_after: u32,
        failure: &'static str,
    }

    #[async_trait]
    impl ChunkSummarizer for FlakyBackend {
        async fn summarize_chunk(&self, _chunk: &str) -> Result<String, BoxError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.succeed_after {
                return Err(self.failure.into());
            }
            Ok("```mermaid\ngraph TD\n    A[Rust] --> B[Ownership]\n```".to_string())
        }

        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    fn flaky(succeed_after: u32, failure: &'static str) -> Arc<FlakyBackend> {
        Arc::new(FlakyBackend {
            calls: AtomicU32::new(0),
            succeed_after,
            failure,
        })
    }

    #[test]
    fn test_extract_mermaid_strips_fences() {
        let mermaid = extract_mermaid("```mermaid\ngraph TD\n  A[x]\n```\n").unwrap();
        assert_eq!(mermaid, "graph TD\n  A[x]");
        assert_eq!(extract_mermaid("graph TD\nA").unwrap(), "graph TD\nA");
        assert_eq!(extract_mermaid("```\ngraph TD\nA\n```").unwrap(), "graph TD\nA");
    }

    #[test]
    fn test_extract_mermaid_rejects_other_diagrams() {
        let err = extract_mermaid("```mermaid\nflowchart LR\nA-->B\n```").unwrap_err();
        assert!(matches!(err, SummarizeError::InvalidMindMap(_)));
        assert!(extract_mermaid("").is_err());
    }

    #[test]
    fn test_retry_delay_doubles() {
        let generator = MindMapGenerator::new(
            flaky(0, ""),
            MindMapConfig::default(),
        )
        .unwrap();
        assert_eq!(generator.retry_delay(0), Duration::from_secs(1));
        assert_eq!(generator.retry_delay(1), Duration::from_secs(2));
        assert_eq!(generator.retry_delay(2), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_rate_limited_calls_are_retried() {
        let backend = flaky(2, "HTTP 429 Too Many Requests");
        let generator = MindMapGenerator::new(backend.clone(), fast_retries(3)).unwrap();

        let map = generator.generate("- Rust\n- Ownership").await.unwrap();
        assert_eq!(map.attempts, 3);
        assert_eq!(map.backend, "flaky");
        assert!(map.mermaid.starts_with("graph TD"));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let backend = flaky(5, "rate limit exceeded");
        let generator = MindMapGenerator::new(backend.clone(), fast_retries(3)).unwrap();

        let err = generator.generate("summary").await.unwrap_err();
        assert!(matches!(err, SummarizeError::MindMapFailed { attempts: 3, .. }));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let backend = flaky(1, "model not found");
        let generator = MindMapGenerator::new(backend.clone(), fast_retries(3)).unwrap();

        let err = generator.generate("summary").await.unwrap_err();
        assert!(matches!(err, SummarizeError::MindMapFailed { attempts: 1, .. }));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blank_input_rejected() {
        let generator = MindMapGenerator::from_app_config(&AppConfig::default()).unwrap();
        let err = generator.generate("  \n").await.unwrap_err();
        assert!(matches!(err, SummarizeError::InvalidMindMap(_)));
    }

    #[tokio::test]
    async fn test_outline_mapper_draws_branches() {
        let generator = MindMapGenerator::from_app_config(&AppConfig::default()).unwrap();
        assert_eq!(generator.backend_name(), "outline");

        let map = generator
            .generate("- Borrowing [rules]\n- Lifetimes (advanced)\n")
            .await
            .unwrap();
        assert_eq!(
            map.mermaid,
            "graph TD\n    A[Summary]\n    A --> N1[Borrowing rules]\n    A --> N2[Lifetimes advanced]"
        );
        assert_eq!(map.attempts, 1);
    }

    #[tokio::test]
    async fn test_outline_mapper_splits_prose() {
        let mapper = OutlineMindMapper::new(SentenceSplitter::new(&DEFAULT_TERMINATORS).unwrap());
        let text: String = (0..12).map(|i| format!("Point {i}. ")).collect();

        let mermaid = mapper.summarize_chunk(&text).await.unwrap();
        assert_eq!(mermaid.lines().count(), 2 + MAX_OUTLINE_BRANCHES);
        assert!(mermaid.contains("N1[Point 0.]"));
        assert!(!mermaid.contains("Point 8."));
    }
}
