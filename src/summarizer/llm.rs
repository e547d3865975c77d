//! LLM-backed chunk backends.
//!
//! Sends each chunk to an Ollama completion model through Rig. The same
//! client serves summarization, proofreading and mind map drafting; only the
//! prompts differ.

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use rig::client::CompletionClient;
use rig::completion::CompletionModel;
use rig::message::AssistantContent;
use rig::providers::ollama;
use tracing::debug;

use crate::core::config::LlmConfig;
use crate::core::errors::{BoxError, SummarizeError, SummarizeResult};
use crate::summarizer::backend::ChunkSummarizer;

/// System prompt for chunk summarization.
const CHUNK_SYSTEM_PROMPT: &str = r"You summarize one section of a video transcript.
The section may start with a few words repeated from the previous section; do not summarize them twice.

RULES:
- Extract the 3 to 5 main points of the section
- One short bullet point per line, starting with '- '
- Keep the language of the transcript
- Do not invent anything that is not in the text
- Output only the bullet points";

/// System prompt for proofreading.
const PROOFREAD_SYSTEM_PROMPT: &str = r"You proofread automatically generated video captions.

RULES:
- Fix misrecognised words, punctuation and sentence breaks
- Split the text into readable paragraphs
- Keep the meaning and the language of the original text
- Do not summarize, shorten or add commentary
- Output only the corrected text";

/// System prompt for mind map drafting.
const MINDMAP_SYSTEM_PROMPT: &str = r"You turn a summary into a Mermaid mind map.

RULES:
- Start the diagram with the line 'graph TD'
- Use one root node for the main topic, then its key points and details as children
- Write node labels in square brackets, for example A[Topic] --> B[Point]
- Keep labels short and in the language of the summary
- Output only the Mermaid code";

/// Which job the completion model is asked to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlmTask {
    /// Condense a chunk into key points.
    Summarize,
    /// Correct a chunk of raw captions.
    Proofread,
    /// Draft a Mermaid diagram from a summary.
    MindMap,
}

impl LlmTask {
    /// Backend name reported for this task.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Summarize => "llm",
            Self::Proofread => "llm-proofread",
            Self::MindMap => "llm-mindmap",
        }
    }

    const fn preamble(self) -> &'static str {
        match self {
            Self::Summarize => CHUNK_SYSTEM_PROMPT,
            Self::Proofread => PROOFREAD_SYSTEM_PROMPT,
            Self::MindMap => MINDMAP_SYSTEM_PROMPT,
        }
    }

    /// Character cap on the answer; only summaries are capped.
    const fn output_cap(self, configured: usize) -> Option<usize> {
        match self {
            Self::Summarize => Some(configured),
            Self::Proofread | Self::MindMap => None,
        }
    }

    fn build_prompt(self, text: &str) -> String {
        match self {
            Self::Summarize => format!(
                "Summarize the following transcript section:\n\n{text}\n\nReturn the key points."
            ),
            Self::Proofread => format!(
                "Proofread the following transcript text:\n\n{text}\n\nReturn the corrected text."
            ),
            Self::MindMap => format!(
                "Create a mind map for the following summary:\n\n{text}\n\nReturn the Mermaid code."
            ),
        }
    }
}

/// Chunk backend driven by an Ollama completion model.
pub struct LlmChunkSummarizer {
    model: ollama::CompletionModel,
    task: LlmTask,
    temperature: f64,
    max_tokens: Option<u64>,
    max_output_chars: usize,
}

impl LlmChunkSummarizer {
    /// Create a new LLM chunk summarizer.
    ///
    /// # Errors
    /// Returns an error if the Ollama client cannot be built.
    pub fn new(config: &LlmConfig) -> SummarizeResult<Self> {
        Self::for_task(config, LlmTask::Summarize)
    }

    /// Create a backend for the given task.
    ///
    /// # Errors
    /// Returns an error if the Ollama client cannot be built.
    pub fn for_task(config: &LlmConfig, task: LlmTask) -> SummarizeResult<Self> {
        let builder = ollama::Client::<ReqwestClient>::builder().api_key(rig::client::Nothing);
        let builder = if let Some(base_url) = &config.base_url {
            builder.base_url(base_url)
        } else {
            builder
        };
        let client = builder.build().map_err(SummarizeError::from)?;
        let model = client.completion_model(config.model.clone());

        Ok(Self {
            model,
            task,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_output_chars: config.max_output_chars,
        })
    }

    /// Task this backend was built for.
    #[must_use]
    pub const fn task(&self) -> LlmTask {
        self.task
    }
}

#[async_trait]
impl ChunkSummarizer for LlmChunkSummarizer {
    async fn summarize_chunk(&self, chunk: &str) -> Result<String, BoxError> {
        if chunk.trim().is_empty() {
            return Ok(String::new());
        }

        debug!(
            "Sending {} chars to LLM ({})",
            chunk.chars().count(),
            self.task.name()
        );

        let prompt = self.task.build_prompt(chunk);
        let request = self
            .model
            .completion_request(prompt)
            .preamble(self.task.preamble().to_string())
            .temperature(self.temperature)
            .max_tokens_opt(self.max_tokens)
            .build();

        let response = self
            .model
            .completion(request)
            .await
            .map_err(|err| format!("completion error: {err}"))?;
        let text = extract_text(&response.choice);
        let text = text.trim();
        Ok(self
            .task
            .output_cap(self.max_output_chars)
            .map_or_else(|| text.to_string(), |max_chars| truncate_to_chars(text, max_chars)))
    }

    fn name(&self) -> &'static str {
        self.task.name()
    }
}

/// Extract text from assistant response.
fn extract_text(choice: &rig::OneOrMany<AssistantContent>) -> String {
    let mut out = String::new();
    for content in choice.iter() {
        if let AssistantContent::Text(text) = content {
            out.push_str(&text.text);
        }
    }
    out
}

/// Truncate a string to a maximum number of characters.
fn truncate_to_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
