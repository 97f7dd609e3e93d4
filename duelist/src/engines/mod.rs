//! The four query engines behind the agent's tools.
//!
//! Each engine takes a detailed plain-text question and produces a text
//! answer; the reasoning agent decides which one to call. Everything
//! LLM-shaped goes through [`crate::llm::Llm`] so the control flow here is
//! testable with canned completions.

pub mod join;
pub mod rulebook;
pub mod sql;
pub mod subquestion;

pub use join::JoinQueryEngine;
pub use rulebook::RulebookQueryEngine;
pub use sql::SqlQueryEngine;
pub use subquestion::SubQuestionEngine;

/// Removes a surrounding markdown code fence (with optional language tag).
pub(crate) fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let mut lines: Vec<&str> = trimmed.lines().collect();
    lines.remove(0);
    if lines
        .last()
        .map(|line| line.trim().starts_with("```"))
        .unwrap_or(false)
    {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}
