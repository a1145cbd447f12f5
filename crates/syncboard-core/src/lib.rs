//! Core types and error definitions for SyncBoard.
//!
//! This crate provides the foundational types shared across all SyncBoard
//! crates: the error enum, tool call abstractions, the skill record data model,
//! and security verdicts.
//!
//! # Main types
//!
//! - [`SyncboardError`] - Unified error enum for all SyncBoard subsystems.
//! - [`SyncboardResult`] - Convenience alias for `Result<T, SyncboardError>`.
//! - [`SkillRecord`] - Administrator-managed skill definition.
//! - [`ToolCall`] / [`ToolOutput`] - Tool invocation request and outcome.
//! - [`SecurityVerdict`] - Allow/deny decision with a stable reason code.

/// Error type and result alias.
pub mod error;
/// Skill records and skill types.
pub mod skill;
/// Tool call, output, and result types.
pub mod tool;
/// Security verdicts and invocation context.
pub mod verdict;

pub use error::{SyncboardError, SyncboardResult};
pub use skill::{SkillRecord, SkillType};
pub use tool::{ToolCall, ToolOutput, ToolResult};
pub use verdict::{codes, InvocationContext, SecurityContext, SecurityVerdict};

/// Maximum number of characters of input or output kept in an audit entry.
pub const MAX_LOGGED_CHARS: usize = 1000;

/// Truncates `text` to at most `max_chars` characters, appending `…` when cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}…", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo wörld", 4), "héll…");
        assert_eq!(truncate("日本語テキスト", 3), "日本語…");
    }
}
