//! services/annotator/src/adapters/dto.rs
//!
//! Wire records for the project backend's JSON bodies. Each record maps into
//! its `thematic_core` domain type through `to_domain`; nothing outside the
//! HTTP adapter sees these shapes.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use thematic_core::domain::{
    Code, CodeAssignment, Comment, Document, ProjectSnapshot, ProjectSummary, Segment,
};

const UNKNOWN_DOCUMENT: &str = "Unknown Document";

//=========================================================================================
// Timestamps
//=========================================================================================

/// The backend emits RFC 3339 as well as naive ISO timestamps (UTC implied).
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(Utc.from_utc_datetime(&naive)))
        .map_err(serde::de::Error::custom)
}

//=========================================================================================
// Project Snapshot
//=========================================================================================

#[derive(Debug, Deserialize)]
pub struct ProjectRecord {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub documents: Option<Vec<DocumentRecord>>,
    pub codes: Option<Vec<CodeRecord>>,
    pub code_assignments: Option<Vec<CodeAssignmentRecord>>,
    pub annotations: Option<Vec<AnnotationRecord>>,
}

impl ProjectRecord {
    pub fn to_domain(self) -> ProjectSnapshot {
        ProjectSnapshot {
            summary: ProjectSummary {
                id: self.id,
                title: self.title,
                description: self.description.unwrap_or_default(),
            },
            documents: self
                .documents
                .map(|docs| docs.into_iter().map(DocumentRecord::to_domain).collect()),
            codes: self
                .codes
                .map(|codes| codes.into_iter().map(CodeRecord::to_domain).collect()),
            code_assignments: self.code_assignments.map(|records| {
                records
                    .into_iter()
                    .map(CodeAssignmentRecord::to_domain)
                    .collect()
            }),
            comments: self
                .annotations
                .map(|records| records.into_iter().map(AnnotationRecord::to_domain).collect()),
        }
    }
}

//=========================================================================================
// Documents and Segments
//=========================================================================================

#[derive(Debug, Deserialize)]
pub struct DocumentRecord {
    pub id: i64,
    pub name: String,
    pub document_type: Option<String>,
    pub file_size: Option<u64>,
    /// Absent (or null) is kept distinct from an empty list.
    pub segments: Option<Vec<SegmentRecord>>,
}

impl DocumentRecord {
    pub fn to_domain(self) -> Document {
        Document {
            id: self.id,
            name: self.name,
            document_type: self.document_type.unwrap_or_default(),
            file_size: self.file_size,
            segments: self
                .segments
                .map(|segments| segments.into_iter().map(SegmentRecord::to_domain).collect()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SegmentRecord {
    pub id: i64,
    pub content: String,
    pub segment_type: Option<String>,
    pub line_number: Option<i64>,
    #[serde(default)]
    pub is_coded: bool,
    #[serde(default)]
    pub code_names: Vec<String>,
}

impl SegmentRecord {
    fn to_domain(self) -> Segment {
        Segment {
            id: self.id,
            content: self.content,
            segment_type: self.segment_type,
            line_number: self.line_number,
            is_coded: self.is_coded,
            code_names: self.code_names,
        }
    }
}

//=========================================================================================
// Codes
//=========================================================================================

/// Codes arrive either as bare names or as full objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CodeRecord {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        definition: Option<String>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        category: Option<String>,
        #[serde(default)]
        color: Option<String>,
    },
}

impl CodeRecord {
    fn to_domain(self) -> Code {
        match self {
            CodeRecord::Name(name) => Code::named(name),
            CodeRecord::Full {
                name,
                definition,
                description,
                category,
                color,
            } => Code {
                name,
                definition,
                description,
                category,
                color,
            },
        }
    }
}

//=========================================================================================
// Comments and Code Assignments
//=========================================================================================

#[derive(Debug, Deserialize)]
pub struct CodeAssignmentRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default, alias = "documentName")]
    pub document_name: String,
    #[serde(default, alias = "selectedText", alias = "text")]
    pub selected_text: String,
    #[serde(alias = "code_name")]
    pub code: String,
    #[serde(default, alias = "created_at", deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub context: String,
}

impl CodeAssignmentRecord {
    fn to_domain(self) -> CodeAssignment {
        CodeAssignment {
            id: self.id,
            document_name: or_unknown(self.document_name),
            selected_text: self.selected_text,
            code: self.code,
            timestamp: self.timestamp.unwrap_or_default(),
            context: self.context,
        }
    }
}

/// Server-side annotations are the comments of the workbench.
#[derive(Debug, Deserialize)]
pub struct AnnotationRecord {
    pub id: i64,
    pub content: String,
    pub document_id: Option<i64>,
    pub document_name: Option<String>,
    pub quote_text: Option<String>,
    pub segment_content: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl AnnotationRecord {
    fn to_domain(self) -> Comment {
        Comment {
            id: self.id,
            document_id: self.document_id,
            document_name: or_unknown(self.document_name.unwrap_or_default()),
            selected_text: self.quote_text.unwrap_or_default(),
            comment: self.content,
            timestamp: self.created_at.unwrap_or_default(),
            page_context: self.segment_content.unwrap_or_default(),
        }
    }
}

fn or_unknown(name: String) -> String {
    if name.is_empty() {
        UNKNOWN_DOCUMENT.to_string()
    } else {
        name
    }
}

//=========================================================================================
// Error Bodies
//=========================================================================================

/// FastAPI-style error body; `detail` is a string or a validation list.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn snapshot_keeps_absent_fields_absent() {
        let record: ProjectRecord = serde_json::from_value(json!({
            "id": 42,
            "title": "Study",
            "owner_id": 3,
            "documents": [
                {"id": 7, "name": "interview1.txt", "document_type": "text", "file_size": 64},
                {"id": 8, "name": "survey.csv", "document_type": "csv", "segments": []}
            ],
            "codes": ["Emotions", {"name": "Coping", "color": "#10B981", "id": 4}]
        }))
        .unwrap();

        let snapshot = record.to_domain();
        assert_eq!(snapshot.summary.description, "");
        let documents = snapshot.documents.unwrap();
        assert_eq!(documents[0].segments, None);
        assert_eq!(documents[1].segments, Some(Vec::new()));
        let codes = snapshot.codes.unwrap();
        assert_eq!(codes[0], Code::named("Emotions"));
        assert_eq!(codes[1].color.as_deref(), Some("#10B981"));
        assert!(snapshot.code_assignments.is_none());
        assert!(snapshot.comments.is_none());
    }

    #[test]
    fn annotations_become_comments() {
        let record: AnnotationRecord = serde_json::from_value(json!({
            "id": 11,
            "content": "fear of change",
            "annotation_type": "note",
            "document_id": 7,
            "document_name": null,
            "quote_text": "I felt anxious",
            "segment_content": "Participant: I felt anxious at first.",
            "project_id": 42,
            "created_at": "2024-03-05T09:15:30.123456"
        }))
        .unwrap();

        let comment = record.to_domain();
        assert_eq!(comment.document_name, "Unknown Document");
        assert_eq!(comment.selected_text, "I felt anxious");
        assert_eq!(comment.page_context, "Participant: I felt anxious at first.");
        assert_eq!(comment.timestamp.year(), 2024);
        assert_eq!(comment.timestamp.hour(), 9);
    }

    #[test]
    fn assignments_accept_client_field_names() {
        let record: CodeAssignmentRecord = serde_json::from_value(json!({
            "id": 1712000000000i64,
            "documentName": "interview1.txt",
            "selectedText": "I felt anxious",
            "code": "Emotions",
            "timestamp": "2024-04-01T12:00:00Z"
        }))
        .unwrap();

        let assignment = record.to_domain();
        assert_eq!(assignment.document_name, "interview1.txt");
        assert_eq!(assignment.selected_text, "I felt anxious");
        assert_eq!(assignment.code, "Emotions");
        assert_eq!(assignment.timestamp.month(), 4);
        assert_eq!(assignment.context, "");
    }

    #[test]
    fn error_detail_is_flattened() {
        let plain: ErrorBody = serde_json::from_value(json!({"detail": "Project not found"})).unwrap();
        assert_eq!(plain.message().as_deref(), Some("Project not found"));

        let list: ErrorBody =
            serde_json::from_value(json!({"detail": [{"msg": "field required"}]})).unwrap();
        assert!(list.message().unwrap().contains("field required"));

        let empty: ErrorBody = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.message(), None);
    }
}
