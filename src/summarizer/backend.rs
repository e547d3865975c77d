//! Pluggable per-chunk summarizers.

use async_trait::async_trait;

use crate::core::errors::BoxError;

/// Turns the text of one chunk into its summary.
///
/// Implementations run concurrently on independent chunks and must not
/// share mutable state between calls.
#[async_trait]
pub trait ChunkSummarizer: Send + Sync {
    /// Summarize a single chunk.
    ///
    /// # Errors
    /// Returns an error if the backend fails; the pipeline run is aborted.
    async fn summarize_chunk(&self, chunk: &str) -> Result<String, BoxError>;

    /// Backend name reported in summary output.
    fn name(&self) -> &str;
}

/// Placeholder summarizer: a label followed by the first characters of the chunk.
#[derive(Clone, Debug)]
pub struct PrefixSummarizer {
    label: String,
    prefix_chars: usize,
}

impl PrefixSummarizer {
    /// Create a placeholder summarizer.
    #[must_use]
    pub fn new(label: impl Into<String>, prefix_chars: usize) -> Self {
        Self {
            label: label.into(),
            prefix_chars,
        }
    }

    fn render(&self, chunk: &str) -> String {
        let prefix: String = chunk.chars().take(self.prefix_chars).collect();
        format!("{}{prefix}", self.label)
    }
}

#[async_trait]
impl ChunkSummarizer for PrefixSummarizer {
    async fn summarize_chunk(&self, chunk: &str) -> Result<String, BoxError> {
        Ok(self.render(chunk))
    }

    fn name(&self) -> &'static str {
        "placeholder"
    }
}

/// Adapts a plain function or closure into a [`ChunkSummarizer`].
pub struct FnSummarizer<F> {
    name: String,
    func: F,
}

impl<F> FnSummarizer<F> {
    /// Wrap `func` under the given backend name.
    #[must_use]
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F, E> ChunkSummarizer for FnSummarizer<F>
where
    F: Fn(&str) -> Result<String, E> + Send + Sync,
    E: Into<BoxError>,
{
    async fn summarize_chunk(&self, chunk: &str) -> Result<String, BoxError> {
        (self.func)(chunk).map_err(Into::into)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prefix_summarizer_truncates_with_label() {
        let summarizer = PrefixSummarizer::new("Summary: ", 5);
        let out = summarizer.summarize_chunk("Hello, world!").await.unwrap();
        assert_eq!(out, "Summary: Hello");
        assert_eq!(summarizer.name(), "placeholder");
    }

    #[tokio::test]
    async fn test_prefix_summarizer_short_chunk_kept_whole() {
        let summarizer = PrefixSummarizer::new("» ", 100);
        let out = summarizer.summarize_chunk("短い。").await.unwrap();
        assert_eq!(out, "» 短い。");
    }

    #[tokio::test]
    async fn test_fn_summarizer_maps_errors() {
        let summarizer = FnSummarizer::new("upper", |chunk: &str| {
            if chunk.is_empty() {
                Err("empty chunk".to_string())
            } else {
                Ok(chunk.to_uppercase())
            }
        });

        assert_eq!(summarizer.summarize_chunk("abc").await.unwrap(), "ABC");
        let err = summarizer.summarize_chunk("").await.unwrap_err();
        assert_eq!(err.to_string(), "empty chunk");
        assert_eq!(summarizer.name(), "upper");
    }
}
