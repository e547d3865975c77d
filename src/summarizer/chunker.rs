//! Sentence-aware transcript chunking with overlap.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::errors::{SummarizeError, SummarizeResult};

/// Splits text into sentences at a configurable set of terminators.
#[derive(Clone, Debug)]
pub struct SentenceSplitter {
    pattern: Regex,
}

impl SentenceSplitter {
    /// Build a splitter for the given terminator characters.
    ///
    /// # Errors
    /// Returns an error if the set is empty or the pattern cannot compile.
    pub fn new(terminators: &[char]) -> SummarizeResult<Self> {
        if terminators.is_empty() {
            return Err(SummarizeError::InvalidConfig(
                "at least one sentence terminator is required".to_string(),
            ));
        }

        let class: String = terminators
            .iter()
            .map(|c| regex::escape(&c.to_string()))
            .collect();
        let pattern = Regex::new(&format!("[{class}]+"))?;

        Ok(Self { pattern })
    }

    /// Split `text` into trimmed, non-empty sentences in order.
    ///
    /// Each sentence keeps its terminator run. Trailing text without a
    /// terminator becomes the last sentence.
    #[must_use]
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut sentences = Vec::new();
        let mut start = 0;

        for found in self.pattern.find_iter(text) {
            let sentence = text[start..found.end()].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = found.end();
        }

        let rest = text[start..].trim();
        if !rest.is_empty() {
            sentences.push(rest);
        }

        sentences
    }
}

/// A bounded, sentence-aligned piece of the transcript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in transcript order.
    pub index: usize,
    /// Chunk text, overlap prefix included.
    pub text: String,
    /// Leading characters of `text` carried over from the previous chunk.
    pub overlap_chars: usize,
}

impl Chunk {
    /// Chunk text without the overlap prefix.
    #[must_use]
    pub fn body(&self) -> &str {
        if self.overlap_chars == 0 {
            return &self.text;
        }
        // overlap prefix is followed by a single joining space
        self.text
            .char_indices()
            .nth(self.overlap_chars + 1)
            .map_or("", |(offset, _)| &self.text[offset..])
    }

    /// Length in characters.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Split `text` into overlapping chunks of whole sentences.
#[must_use]
pub fn chunk_transcript(
    splitter: &SentenceSplitter,
    text: &str,
    chunk_size: usize,
    overlap_size: usize,
) -> Vec<Chunk> {
    let mut accumulator = ChunkAccumulator::new(chunk_size, overlap_size);
    for sentence in splitter.split(text) {
        accumulator.push(sentence);
    }
    accumulator.finish()
}

struct ChunkAccumulator<'a> {
    chunk_size: usize,
    overlap_size: usize,
    chunks: Vec<Chunk>,
    seed: Option<String>,
    sentences: Vec<&'a str>,
    length: usize,
}

impl<'a> ChunkAccumulator<'a> {
    const fn new(chunk_size: usize, overlap_size: usize) -> Self {
        Self {
            chunk_size,
            overlap_size,
            chunks: Vec::new(),
            seed: None,
            sentences: Vec::new(),
            length: 0,
        }
    }

    fn push(&mut self, sentence: &'a str) {
        let sentence_len = sentence.chars().count();
        // a chunk holding only the overlap seed is never closed
        if !self.sentences.is_empty() && self.length + sentence_len > self.chunk_size {
            self.close();
        }
        self.sentences.push(sentence);
        self.length += sentence_len;
    }

    fn close(&mut self) {
        let tail = self
            .sentences
            .last()
            .map(|last| tail_chars(last, self.overlap_size))
            .unwrap_or_default();

        self.emit();

        if tail.is_empty() {
            self.length = 0;
        } else {
            self.length = tail.chars().count();
            self.seed = Some(tail);
        }
    }

    fn emit(&mut self) {
        let seed = self.seed.take();
        let overlap_chars = seed.as_deref().map_or(0, |s| s.chars().count());

        let mut parts: Vec<&str> = Vec::with_capacity(self.sentences.len() + 1);
        if let Some(seed) = seed.as_deref() {
            parts.push(seed);
        }
        parts.extend(self.sentences.iter().copied());

        self.chunks.push(Chunk {
            index: self.chunks.len(),
            text: parts.join(" "),
            overlap_chars,
        });
        self.sentences.clear();
    }

    fn finish(mut self) -> Vec<Chunk> {
        if !self.sentences.is_empty() {
            self.emit();
        }
        self.chunks
    }
}

/// Last `count` characters of `text`, leading whitespace removed.
fn tail_chars(text: &str, count: usize) -> String {
    if count == 0 {
        return String::new();
    }
    let total = text.chars().count();
    let skip = total.saturating_sub(count);
    text.chars().skip(skip).collect::<String>().trim_start().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DEFAULT_TERMINATORS;

    fn splitter() -> SentenceSplitter {
        SentenceSplitter::new(&DEFAULT_TERMINATORS).unwrap()
    }

    /// Sentences of roughly `len` characters each, numbered for traceability.
    fn numbered_sentences(count: usize, len: usize) -> Vec<String> {
        (0..count)
            .map(|i| {
                let head = format!("S{i} ");
                let filler = "x".repeat(len.saturating_sub(head.len() + 1));
                format!("{head}{filler}.")
            })
            .collect()
    }

    #[test]
    fn test_split_ascii_and_fullwidth() {
        let sentences = splitter().split("Hello there. How are you? 今日は晴れ。すごい！Fine");
        assert_eq!(
            sentences,
            vec!["Hello there.", "How are you?", "今日は晴れ。", "すごい！", "Fine"]
        );
    }

    #[test]
    fn test_split_keeps_terminator_runs() {
        let sentences = splitter().split("Wait... what?! Ok.");
        assert_eq!(sentences, vec!["Wait...", "what?!", "Ok."]);
    }

    #[test]
    fn test_custom_terminators() {
        let splitter = SentenceSplitter::new(&[';', '-']).unwrap();
        assert_eq!(splitter.split("a; b - c. d"), vec!["a;", "b -", "c. d"]);
    }

    #[test]
    fn test_empty_terminators_rejected() {
        assert!(SentenceSplitter::new(&[]).is_err());
    }

    #[test]
    fn test_empty_transcript_yields_no_chunks() {
        assert!(chunk_transcript(&splitter(), "", 1500, 100).is_empty());
        assert!(chunk_transcript(&splitter(), "   \n ", 1500, 100).is_empty());
    }

    #[test]
    fn test_unterminated_text_is_one_chunk() {
        let text = "no punctuation at all in this caption track";
        let chunks = chunk_transcript(&splitter(), text, 10, 3);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].overlap_chars, 0);
    }

    #[test]
    fn test_short_transcript_fits_one_chunk() {
        let text = numbered_sentences(20, 50).join(" ");
        assert_eq!(text.chars().count(), 20 * 50 + 19);

        let chunks = chunk_transcript(&splitter(), &text, 1500, 100);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
    }

    #[test]
    fn test_single_long_sentence_not_truncated() {
        let sentence = format!("{}.", "word ".repeat(100).trim_end());
        let chunks = chunk_transcript(&splitter(), &sentence, 50, 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, sentence);
    }

    #[test]
    fn test_chunks_respect_size_before_trigger() {
        let chunk_size = 120;
        let text = numbered_sentences(30, 40).join(" ");
        let chunks = chunk_transcript(&splitter(), &text, chunk_size, 15);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            let sentences = splitter().split(chunk.body());
            let accumulated: usize =
                chunk.overlap_chars + sentences.iter().map(|s| s.chars().count()).sum::<usize>();
            assert!(
                accumulated <= chunk_size || sentences.len() == 1,
                "chunk {} accumulated {accumulated} chars",
                chunk.index
            );
        }
    }

    #[test]
    fn test_no_sentence_lost_across_chunks() {
        let sentences = numbered_sentences(25, 33);
        let text = sentences.join(" ");
        let chunks = chunk_transcript(&splitter(), &text, 100, 12);

        let rebuilt: Vec<&str> = chunks.iter().map(Chunk::body).collect();
        assert_eq!(rebuilt.join(" "), text);
    }

    #[test]
    fn test_overlap_comes_from_previous_chunk_tail() {
        let overlap = 12;
        let text = numbered_sentences(12, 40).join(" ");
        let chunks = chunk_transcript(&splitter(), &text, 100, overlap);

        assert_eq!(chunks[0].overlap_chars, 0);
        for pair in chunks.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            assert!(next.overlap_chars <= overlap);
            let seed: String = next.text.chars().take(next.overlap_chars).collect();
            assert!(prev.text.ends_with(&seed), "{seed:?} not a tail of {:?}", prev.text);
        }
    }

    #[test]
    fn test_zero_overlap_has_no_seed() {
        let text = numbered_sentences(10, 30).join(" ");
        let chunks = chunk_transcript(&splitter(), &text, 70, 0);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|chunk| chunk.overlap_chars == 0));
        assert!(chunks.iter().all(|chunk| chunk.body() == chunk.text));
    }

    #[test]
    fn test_indices_follow_transcript_order() {
        let text = numbered_sentences(15, 30).join(" ");
        let chunks = chunk_transcript(&splitter(), &text, 80, 5);
        for (expected, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, expected);
        }
    }

    #[test]
    fn test_overlap_counts_characters_not_bytes() {
        let text = "あいうえおかきくけこ。さしすせそたちつてと。なにぬねの。";
        let chunks = chunk_transcript(&splitter(), text, 12, 3);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].overlap_chars, 3);
        assert!(chunks[1].text.starts_with("けこ。 "));
        assert_eq!(chunks[1].body(), "さしすせそたちつてと。");
    }

    #[test]
    fn test_tail_chars() {
        assert_eq!(tail_chars("hello world.", 6), "world.");
        assert_eq!(tail_chars("hi.", 10), "hi.");
        assert_eq!(tail_chars("hello", 0), "");
    }
}
