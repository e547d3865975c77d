//! Configuration for the pipelines, transcript source and server.

use std::net::IpAddr;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::errors::{SummarizeError, SummarizeResult};

/// Sentence terminators recognised by default (ASCII and full-width).
pub const DEFAULT_TERMINATORS: [char; 6] = ['.', '!', '?', '。', '！', '？'];

/// Fallback worker count when the host parallelism cannot be queried.
const FALLBACK_CONCURRENCY: usize = 4;

/// Resolve an optional worker cap against the host parallelism.
fn resolve_concurrency(max_concurrency: Option<usize>) -> usize {
    max_concurrency.unwrap_or_else(|| {
        std::thread::available_parallelism().map_or(FALLBACK_CONCURRENCY, NonZeroUsize::get)
    })
}

/// Settings for the chunk / summarize / combine / trim pipeline.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Maximum accumulated chunk length in characters.
    pub chunk_size: usize,
    /// Characters carried from the end of a closed chunk into the next one.
    pub overlap_size: usize,
    /// Fraction of the original transcript length kept in the final summary.
    pub target_ratio: f64,
    /// Upper bound on concurrent chunk summaries (`None` = host parallelism).
    pub max_concurrency: Option<usize>,
    /// Characters that end a sentence.
    pub sentence_terminators: Vec<char>,
    /// Characters kept by the placeholder summarizer.
    pub placeholder_prefix_chars: usize,
    /// Label prepended by the placeholder summarizer.
    pub placeholder_label: String,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            overlap_size: 100,
            target_ratio: 0.3,
            max_concurrency: None,
            sentence_terminators: DEFAULT_TERMINATORS.to_vec(),
            placeholder_prefix_chars: 200,
            placeholder_label: "Summary: ".to_string(),
        }
    }
}

impl SummarizerConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum chunk size.
    #[must_use]
    pub const fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the overlap size.
    #[must_use]
    pub const fn with_overlap_size(mut self, overlap_size: usize) -> Self {
        self.overlap_size = overlap_size;
        self
    }

    /// Set the target ratio.
    #[must_use]
    pub const fn with_target_ratio(mut self, target_ratio: f64) -> Self {
        self.target_ratio = target_ratio;
        self
    }

    /// Cap the number of concurrent chunk summaries.
    #[must_use]
    pub const fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = Some(max_concurrency);
        self
    }

    /// Replace the sentence terminator set.
    #[must_use]
    pub fn with_terminators(mut self, terminators: impl IntoIterator<Item = char>) -> Self {
        self.sentence_terminators = terminators.into_iter().collect();
        self
    }

    /// Number of workers used for chunk summarization.
    #[must_use]
    pub fn effective_concurrency(&self) -> usize {
        resolve_concurrency(self.max_concurrency)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range.
    pub fn validate(&self) -> SummarizeResult<()> {
        if self.chunk_size == 0 {
            return Err(SummarizeError::InvalidConfig(
                "chunk_size must be > 0".to_string(),
            ));
        }

        if self.overlap_size >= self.chunk_size {
            return Err(SummarizeError::InvalidConfig(format!(
                "overlap_size ({}) must be smaller than chunk_size ({})",
                self.overlap_size, self.chunk_size
            )));
        }

        if !self.target_ratio.is_finite() || self.target_ratio <= 0.0 || self.target_ratio > 1.0 {
            return Err(SummarizeError::InvalidConfig(format!(
                "target_ratio must be in (0, 1], got {}",
                self.target_ratio
            )));
        }

        if self.max_concurrency == Some(0) {
            return Err(SummarizeError::InvalidConfig(
                "max_concurrency must be > 0".to_string(),
            ));
        }

        if self.sentence_terminators.is_empty() {
            return Err(SummarizeError::InvalidConfig(
                "sentence_terminators must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Settings for chunked proofreading.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProofreadConfig {
    /// Maximum accumulated chunk length in characters.
    pub chunk_size: usize,
    /// Upper bound on concurrent chunk edits (`None` = host parallelism).
    pub max_concurrency: Option<usize>,
}

impl Default for ProofreadConfig {
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            max_concurrency: None,
        }
    }
}

impl ProofreadConfig {
    /// Number of workers used for chunk edits.
    #[must_use]
    pub fn effective_concurrency(&self) -> usize {
        resolve_concurrency(self.max_concurrency)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if the chunk size or worker cap is zero.
    pub fn validate(&self) -> SummarizeResult<()> {
        if self.chunk_size == 0 {
            return Err(SummarizeError::InvalidConfig(
                "proofread.chunk_size must be > 0".to_string(),
            ));
        }
        if self.max_concurrency == Some(0) {
            return Err(SummarizeError::InvalidConfig(
                "proofread.max_concurrency must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for mind map generation.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MindMapConfig {
    /// Attempts made before giving up on a rate-limited backend.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled on every further retry.
    #[serde(with = "duration_serde")]
    pub retry_base_delay: Duration,
}

impl Default for MindMapConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_base_delay: Duration::from_secs(1),
        }
    }
}

impl MindMapConfig {
    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if no attempt is allowed.
    pub fn validate(&self) -> SummarizeResult<()> {
        if self.max_attempts == 0 {
            return Err(SummarizeError::InvalidConfig(
                "mindmap.max_attempts must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which model backs the pipelines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryBackend {
    /// Deterministic stand-ins that make no model calls.
    #[default]
    Placeholder,
    /// Ollama completion model through Rig.
    Llm,
}

impl FromStr for SummaryBackend {
    type Err = SummarizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "placeholder" | "prefix" => Ok(Self::Placeholder),
            "llm" | "ollama" => Ok(Self::Llm),
            other => Err(SummarizeError::InvalidConfig(format!(
                "unknown summary backend: {other}"
            ))),
        }
    }
}

/// Completion model settings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama completion model name.
    pub model: String,
    /// Temperature for generation.
    pub temperature: f64,
    /// Optional max tokens.
    pub max_tokens: Option<u64>,
    /// Optional custom base URL.
    pub base_url: Option<String>,
    /// Cap on characters kept from each model answer.
    pub max_output_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "ministral-3:8b-instruct-2512-q8_0".to_string(),
            temperature: 0.3,
            max_tokens: None,
            base_url: None,
            max_output_chars: 1200,
        }
    }
}

/// Caption and metadata retrieval settings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TranscriptConfig {
    /// Language codes tried in order before the default track.
    pub languages: Vec<String>,
    /// Request timeout.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// Caption endpoint.
    pub base_url: String,
    /// Data API key; without it video details come from `oEmbed`.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Data API videos endpoint.
    pub data_api_url: String,
    /// `oEmbed` endpoint.
    pub oembed_url: String,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string(), "ja".to_string()],
            request_timeout: Duration::from_secs(20),
            base_url: "https://www.youtube.com/api/timedtext".to_string(),
            api_key: None,
            data_api_url: "https://www.googleapis.com/youtube/v3/videos".to_string(),
            oembed_url: "https://www.youtube.com/oembed".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Listening address.
    pub host: String,
    /// Listening port.
    pub port: u16,
    /// Origins allowed by CORS; empty allows any origin.
    pub cors_origins: Vec<String>,
    /// Whether summary reports are cached per video.
    pub cache_enabled: bool,
    /// TTL for cached summaries (seconds).
    pub cache_ttl_seconds: u64,
    /// Maximum cache size (number of entries).
    pub cache_max_entries: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: Vec::new(),
            cache_enabled: true,
            cache_ttl_seconds: 3600, // 1 hour
            cache_max_entries: 256,
        }
    }
}

/// Top-level application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Summarization pipeline settings.
    pub summarizer: SummarizerConfig,
    /// Proofreading pipeline settings.
    pub proofread: ProofreadConfig,
    /// Mind map settings.
    pub mindmap: MindMapConfig,
    /// Model backend shared by every pipeline.
    pub backend: SummaryBackend,
    /// Completion model settings.
    pub llm: LlmConfig,
    /// Caption retrieval settings.
    pub transcript: TranscriptConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
}

impl AppConfig {
    /// Build configuration from `INSIGHTMAP_*` environment variables.
    ///
    /// # Errors
    /// Returns an error if a variable is set but cannot be parsed, or the
    /// resulting configuration is invalid.
    pub fn from_env() -> SummarizeResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns an error if a value cannot be parsed or fails validation.
    pub fn from_lookup<F>(lookup: F) -> SummarizeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_pipeline_vars(&lookup)?;
        config.apply_source_vars(&lookup);
        config.apply_server_vars(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_pipeline_vars<F>(&mut self, lookup: &F) -> SummarizeResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(size) = parse_var(lookup, "INSIGHTMAP_CHUNK_SIZE")? {
            self.summarizer.chunk_size = size;
        }
        if let Some(overlap) = parse_var(lookup, "INSIGHTMAP_OVERLAP")? {
            self.summarizer.overlap_size = overlap;
        }
        if let Some(ratio) = parse_var(lookup, "INSIGHTMAP_TARGET_RATIO")? {
            self.summarizer.target_ratio = ratio;
        }
        if let Some(workers) = parse_var(lookup, "INSIGHTMAP_MAX_CONCURRENCY")? {
            self.summarizer.max_concurrency = Some(workers);
            self.proofread.max_concurrency = Some(workers);
        }
        if let Some(size) = parse_var(lookup, "INSIGHTMAP_PROOFREAD_CHUNK_SIZE")? {
            self.proofread.chunk_size = size;
        }
        if let Some(attempts) = parse_var(lookup, "INSIGHTMAP_MINDMAP_ATTEMPTS")? {
            self.mindmap.max_attempts = attempts;
        }
        if let Some(backend) = parse_var(lookup, "INSIGHTMAP_BACKEND")? {
            self.backend = backend;
        }
        Ok(())
    }

    fn apply_source_vars<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(languages) = lookup("INSIGHTMAP_LANGUAGES") {
            self.transcript.languages = split_list(&languages);
        }
        if let Some(api_key) = lookup("INSIGHTMAP_YOUTUBE_API_KEY").filter(|key| !key.trim().is_empty()) {
            self.transcript.api_key = Some(api_key);
        }
        if let Some(base_url) = lookup("INSIGHTMAP_OLLAMA_URL") {
            self.llm.base_url = Some(base_url);
        }
        if let Some(model) = lookup("INSIGHTMAP_MODEL") {
            self.llm.model = model;
        }
    }

    fn apply_server_vars<F>(&mut self, lookup: &F) -> SummarizeResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("INSIGHTMAP_HOST") {
            self.server.host = host.trim().to_string();
        }
        if let Some(port) = parse_var(lookup, "INSIGHTMAP_PORT")? {
            self.server.port = port;
        }
        if let Some(origins) = lookup("INSIGHTMAP_CORS_ORIGINS") {
            self.server.cors_origins = split_list(&origins);
        }
        Ok(())
    }

    /// Validate all sections.
    ///
    /// # Errors
    /// Returns an error if any section is invalid.
    pub fn validate(&self) -> SummarizeResult<()> {
        self.summarizer.validate()?;
        self.proofread.validate()?;
        self.mindmap.validate()?;

        if let Some(base_url) = &self.llm.base_url {
            Url::parse(base_url)?;
        }
        Url::parse(&self.transcript.base_url)?;
        Url::parse(&self.transcript.data_api_url)?;
        Url::parse(&self.transcript.oembed_url)?;

        if self.server.host.parse::<IpAddr>().is_err() {
            return Err(SummarizeError::InvalidConfig(format!(
                "server.host is not an IP address: {}",
                self.server.host
            )));
        }
        if self.server.cache_max_entries == 0 {
            return Err(SummarizeError::InvalidConfig(
                "server.cache_max_entries must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> SummarizeResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| SummarizeError::InvalidConfig(format!("{key} has invalid value '{raw}'")))
        })
        .transpose()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// Serde module for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
