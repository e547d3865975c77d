//! Bounded parallel chunk summarization that preserves chunk order.

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::errors::{SummarizeError, SummarizeResult};
use crate::summarizer::backend::ChunkSummarizer;
use crate::summarizer::chunker::Chunk;

/// Summary of one chunk, tagged with the chunk's position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSummary {
    /// Index of the source chunk.
    pub index: usize,
    /// Summarizer output.
    pub text: String,
}

/// Summarize every chunk on its own tokio task.
///
/// At most `concurrency` tasks are in flight. Results come back in chunk
/// order regardless of completion order; the first failure in that order
/// aborts the call. Must be called from within a tokio runtime.
///
/// # Errors
/// Returns [`SummarizeError::ChunkFailed`] if a summarizer call fails and
/// [`SummarizeError::WorkerPanicked`] if a worker task dies.
pub async fn summarize_chunks(
    chunks: Vec<Chunk>,
    summarizer: Arc<dyn ChunkSummarizer>,
    concurrency: usize,
) -> SummarizeResult<Vec<ChunkSummary>> {
    let limit = concurrency.max(1);
    debug!(chunks = chunks.len(), limit, "Dispatching chunk summaries");

    stream::iter(chunks.into_iter().map(move |chunk| {
        let worker = Arc::clone(&summarizer);
        async move { summarize_one(chunk, worker).await }
    }))
    .buffered(limit)
    .try_collect()
    .await
}

async fn summarize_one(
    chunk: Chunk,
    summarizer: Arc<dyn ChunkSummarizer>,
) -> SummarizeResult<ChunkSummary> {
    let index = chunk.index;
    let handle = tokio::spawn(async move {
        summarizer
            .summarize_chunk(&chunk.text)
            .await
            .map_err(|err| err.to_string())
    });

    match handle.await {
        Ok(Ok(text)) => {
            debug!(index, chars = text.chars().count(), "Chunk summarized");
            Ok(ChunkSummary { index, text })
        }
        Ok(Err(message)) => {
            warn!(index, %message, "Chunk summarization failed");
            Err(SummarizeError::ChunkFailed { index, message })
        }
        Err(join_err) => {
            warn!(index, error = %join_err, "Chunk summarization worker died");
            Err(SummarizeError::WorkerPanicked {
                index,
                message: join_err.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use rand::Rng;

    use super::*;
    use crate::core::errors::BoxError;
    use crate::summarizer::backend::PrefixSummarizer;

    fn chunks(count: usize) -> Vec<Chunk> {
        (0..count)
            .map(|index| Chunk {
                index,
                text: format!("chunk number {index}."),
                overlap_chars: 0,
            })
            .collect()
    }

    /// Sleeps a random amount before echoing, so completion order is shuffled.
    struct JitterSummarizer;

    #[async_trait]
    impl ChunkSummarizer for JitterSummarizer {
        async fn summarize_chunk(&self, chunk: &str) -> Result<String, BoxError> {
            let delay = rand::thread_rng().gen_range(0..25);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(chunk.to_uppercase())
        }

        fn name(&self) -> &'static str {
            "jitter"
        }
    }

    /// Fails on one chunk index.
    struct FailingSummarizer {
        fail_on: String,
    }

    #[async_trait]
    impl ChunkSummarizer for FailingSummarizer {
        async fn summarize_chunk(&self, chunk: &str) -> Result<String, BoxError> {
            if chunk == self.fail_on {
                return Err("model refused".into());
            }
            Ok(chunk.to_string())
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    /// Records the highest number of simultaneous calls.
    struct GaugeSummarizer {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl ChunkSummarizer for GaugeSummarizer {
        async fn summarize_chunk(&self, chunk: &str) -> Result<String, BoxError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(chunk.to_string())
        }

        fn name(&self) -> &'static str {
            "gauge"
        }
    }

    struct PanickingSummarizer;

    #[async_trait]
    impl ChunkSummarizer for PanickingSummarizer {
        #[allow(clippy::panic)]
        async fn summarize_chunk(&self, _chunk: &str) -> Result<String, BoxError> {
            panic!("backend crashed");
        }

        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_order_preserved_under_random_delays() {
        for _ in 0..5 {
            let input = chunks(24);
            let expected: Vec<String> = input.iter().map(|c| c.text.to_uppercase()).collect();

            let summaries = summarize_chunks(input, Arc::new(JitterSummarizer), 8)
                .await
                .unwrap();

            let indices: Vec<usize> = summaries.iter().map(|s| s.index).collect();
            assert_eq!(indices, (0..24).collect::<Vec<_>>());
            let texts: Vec<String> = summaries.into_iter().map(|s| s.text).collect();
            assert_eq!(texts, expected);
        }
    }

    #[tokio::test]
    async fn test_empty_input_yields_empty_output() {
        let summaries = summarize_chunks(Vec::new(), Arc::new(PrefixSummarizer::new("S: ", 5)), 4)
            .await
            .unwrap();
        assert!(summaries.is_empty());
    }

    #[tokio::test]
    async fn test_failure_aborts_whole_call() {
        let summarizer = FailingSummarizer {
            fail_on: "chunk number 3.".to_string(),
        };
        let err = summarize_chunks(chunks(6), Arc::new(summarizer), 2)
            .await
            .unwrap_err();

        match err {
            SummarizeError::ChunkFailed { index, message } => {
                assert_eq!(index, 3);
                assert_eq!(message, "model refused");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_panicking_worker_is_reported() {
        let err = summarize_chunks(chunks(2), Arc::new(PanickingSummarizer), 2)
            .await
            .unwrap_err();
        assert!(matches!(err, SummarizeError::WorkerPanicked { index: 0, .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let gauge = Arc::new(GaugeSummarizer {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let summarizer: Arc<dyn ChunkSummarizer> = gauge.clone();

        let summaries = summarize_chunks(chunks(16), summarizer, 3).await.unwrap();

        assert_eq!(summaries.len(), 16);
        assert!(gauge.peak.load(Ordering::SeqCst) <= 3);
        assert!(gauge.peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_zero_concurrency_treated_as_one() {
        let summaries = summarize_chunks(chunks(3), Arc::new(PrefixSummarizer::new("", 5)), 0)
            .await
            .unwrap();
        assert_eq!(summaries.len(), 3);
    }
}
