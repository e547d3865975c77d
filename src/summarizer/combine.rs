//! Recombination of chunk summaries and length-targeted trimming.

use crate::summarizer::dispatch::ChunkSummary;

/// Separator placed between consecutive chunk summaries.
pub const SUMMARY_SEPARATOR: &str = "\n";

/// Join chunk summaries in order, one per line.
#[must_use]
pub fn combine_summaries(summaries: &[ChunkSummary]) -> String {
    summaries
        .iter()
        .map(|summary| summary.text.as_str())
        .collect::<Vec<_>>()
        .join(SUMMARY_SEPARATOR)
}

/// Target summary length: `floor(original_chars * ratio)`.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn target_length(original_chars: usize, ratio: f64) -> usize {
    (original_chars as f64 * ratio).floor() as usize
}

/// Truncate `combined` to `target_chars` characters and strip surrounding whitespace.
///
/// Truncation is by character count only and may cut mid-sentence.
#[must_use]
pub fn trim_to_target(combined: &str, target_chars: usize) -> String {
    let truncated: String = combined.chars().take(target_chars).collect();
    truncated.trim().to_string()
}
