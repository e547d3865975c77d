//! Shared configuration and error types.

pub mod config;
pub mod errors;

pub use config::{AppConfig, LlmConfig, ServerConfig, SummarizerConfig, SummaryBackend, TranscriptConfig};
pub use errors::{BoxError, SummarizeError, SummarizeResult};
