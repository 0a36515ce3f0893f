//! crates/thematic_core/src/domain.rs
//!
//! Defines the pure, core data structures for the annotation workbench.
//! These structs are independent of any wire or serialization format; the
//! backend adapter maps its own records into them.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

pub type ProjectId = i64;
pub type DocumentId = i64;
pub type SegmentId = i64;

/// A backend-defined sub-unit of a document (a line, a CSV row, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: SegmentId,
    pub content: String,
    pub segment_type: Option<String>,
    pub line_number: Option<i64>,
    pub is_coded: bool,
    pub code_names: Vec<String>,
}

/// A document uploaded into a project.
///
/// `segments` is `None` when the backend omitted the field entirely, which is
/// distinct from a document that has no segments (`Some(vec![])`).
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    pub document_type: String,
    pub file_size: Option<u64>,
    pub segments: Option<Vec<Segment>>,
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        DocumentKind::from_type(&self.document_type)
    }
}

/// A user-defined tag applied to passages of text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Code {
    pub name: String,
    pub definition: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub color: Option<String>,
}

impl Code {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Transient record of the user's current text selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionCandidate {
    pub text: String,
    pub document_id: DocumentId,
    pub document_name: String,
    pub context: String,
    pub timestamp: DateTime<Utc>,
}

/// A free-text comment attached to a quoted passage.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub document_id: Option<DocumentId>,
    pub document_name: String,
    pub selected_text: String,
    pub comment: String,
    pub timestamp: DateTime<Utc>,
    pub page_context: String,
}

/// The association of one code to one quoted passage.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeAssignment {
    pub id: i64,
    pub document_name: String,
    pub selected_text: String,
    pub code: String,
    pub timestamp: DateTime<Utc>,
    pub context: String,
}

/// Project-level metadata carried alongside the snapshot collections.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub title: String,
    pub description: String,
}

/// The complete backend state for a project, fetched in one call.
///
/// Every collection is optional: a field the backend left out must not wipe
/// the corresponding local collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSnapshot {
    pub summary: ProjectSummary,
    pub documents: Option<Vec<Document>>,
    pub codes: Option<Vec<Code>>,
    pub code_assignments: Option<Vec<CodeAssignment>>,
    pub comments: Option<Vec<Comment>>,
}

/// A file chosen locally but not yet uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedFile {
    pub file_name: String,
    pub content: Bytes,
    /// Overrides the document name on single uploads.
    pub display_name: Option<String>,
    pub description: Option<String>,
}

impl StagedFile {
    pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
            display_name: None,
            description: None,
        }
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }
}

//=========================================================================================
// Document Kinds
//=========================================================================================

/// Closed set of presentation kinds, keyed by normalized document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Table,
    Article,
    Generic,
}

impl DocumentKind {
    /// Accepts either a backend `document_type` or a bare file extension.
    pub fn from_type(raw: &str) -> Self {
        match normalize_extension(raw).as_str() {
            "pdf" => DocumentKind::Pdf,
            "csv" | "xlsx" | "xls" => DocumentKind::Table,
            "docx" | "doc" | "text" | "txt" => DocumentKind::Article,
            _ => DocumentKind::Generic,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Table => "table",
            DocumentKind::Article => "article",
            DocumentKind::Generic => "file",
        }
    }
}

fn normalize_extension(raw: &str) -> String {
    raw.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Maps a file name onto the backend's `document_type` vocabulary.
pub fn document_type_for_file_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            let ext = normalize_extension(ext);
            if ext == "txt" {
                "text".to_string()
            } else {
                ext
            }
        }
        _ => "text".to_string(),
    }
}

//=========================================================================================
// Local Identifiers
//=========================================================================================

/// Time-based identifiers for records created before the backend sees them.
///
/// Ids are the creation time in milliseconds, bumped forward when two records
/// land in the same millisecond so they stay unique within one client.
#[derive(Debug, Default)]
pub struct LocalIds {
    last: AtomicI64,
}

impl LocalIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self, now: DateTime<Utc>) -> i64 {
        let candidate = now.timestamp_millis();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let id = candidate.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, id, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return id,
                Err(actual) => last = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn document_kind_lookup_is_case_and_dot_insensitive() {
        assert_eq!(DocumentKind::from_type("PDF"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_type(".xlsx"), DocumentKind::Table);
        assert_eq!(DocumentKind::from_type("text"), DocumentKind::Article);
        assert_eq!(DocumentKind::from_type("pptx"), DocumentKind::Generic);
        assert_eq!(DocumentKind::from_type(""), DocumentKind::Generic);
    }

    #[test]
    fn document_type_follows_extension() {
        assert_eq!(document_type_for_file_name("interview1.txt"), "text");
        assert_eq!(document_type_for_file_name("Survey.CSV"), "csv");
        assert_eq!(document_type_for_file_name("notes"), "text");
        assert_eq!(document_type_for_file_name(".hidden"), "text");
    }

    #[test]
    fn local_ids_never_repeat_within_a_millisecond() {
        let ids = LocalIds::new();
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let a = ids.next(now);
        let b = ids.next(now);
        assert_eq!(a, 1_700_000_000_000);
        assert_eq!(b, a + 1);
    }
}
