//! crates/thematic_core/src/browse.rs
//!
//! Helpers for the comment list and the codebook: search, truncation and
//! fallback code colours.

use crate::domain::{Code, CodeAssignment, Comment};

pub const COMMENT_PREVIEW_LEN: usize = 150;
pub const CODEBOOK_PREVIEW_LEN: usize = 100;

const PALETTE: [&str; 8] = [
    "#8B5CF6", "#10B981", "#3B82F6", "#F59E0B", "#EC4899", "#6366F1", "#14B8A6", "#F43F5E",
];

fn matches_query(query: &str, fields: &[&str]) -> bool {
    let query = query.to_lowercase();
    fields.iter().any(|f| f.to_lowercase().contains(&query))
}

/// Comments whose document name, quoted text or body contain `query`, ignoring case.
pub fn filter_comments<'a>(comments: &'a [Comment], query: &str) -> Vec<&'a Comment> {
    comments
        .iter()
        .filter(|c| {
            matches_query(
                query,
                &[c.document_name.as_str(), c.selected_text.as_str(), c.comment.as_str()],
            )
        })
        .collect()
}

/// Assignments whose document name, quoted text or code contain `query`, ignoring case.
pub fn filter_code_assignments<'a>(
    assignments: &'a [CodeAssignment],
    query: &str,
) -> Vec<&'a CodeAssignment> {
    assignments
        .iter()
        .filter(|a| {
            matches_query(
                query,
                &[a.document_name.as_str(), a.selected_text.as_str(), a.code.as_str()],
            )
        })
        .collect()
}

/// Cuts `text` to `max_chars` characters and marks the cut with `...`.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// A stable palette colour derived from the first character of `name`.
pub fn fallback_color(name: &str) -> &'static str {
    let index = name.chars().next().map_or(0, |c| c as usize % PALETTE.len());
    PALETTE[index]
}

/// The code's own colour, or the palette fallback.
pub fn code_color(code: &Code) -> &str {
    code.color.as_deref().unwrap_or_else(|| fallback_color(&code.name))
}
