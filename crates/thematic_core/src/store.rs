//! crates/thematic_core/src/store.rs
//!
//! The single typed store holding every collection the workbench shows.
//!
//! All mutation goes through `Store::dispatch` with an explicit `Action`. An
//! action that would break an invariant is rejected with a `StoreError` and
//! leaves the state exactly as it was.

use crate::domain::{
    Code, CodeAssignment, Comment, Document, DocumentId, ProjectId, ProjectSnapshot,
    ProjectSummary, Segment, SelectionCandidate, StagedFile,
};
use crate::surface::Point;
use tracing::{debug, warn};

//=========================================================================================
// State Types
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Workspace,
    Login,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

/// A transient, dismissible message.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Toolbar {
    pub visible: bool,
    pub anchor: Option<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDocument {
    pub id: DocumentId,
    pub name: String,
}

impl From<&Document> for ActiveDocument {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id,
            name: document.name.clone(),
        }
    }
}

/// The comment-entry form.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentDraft {
    pub candidate: Option<SelectionCandidate>,
    pub body: String,
}

impl CommentDraft {
    /// The read-only quoted text shown above the comment body.
    pub fn quoted_text(&self) -> Option<&str> {
        self.candidate.as_ref().map(|c| c.text.as_str())
    }

    pub fn can_commit(&self) -> bool {
        self.candidate.is_some() && !self.body.trim().is_empty()
    }
}

/// The code-selection form.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeDraft {
    pub candidate: Option<SelectionCandidate>,
    pub chosen: Option<String>,
}

impl CodeDraft {
    pub fn can_commit(&self) -> bool {
        self.candidate.is_some() && self.chosen.is_some()
    }
}

/// Fields of the "create a code" form, as typed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewCodeFields {
    pub name: String,
    pub definition: String,
    pub description: String,
    pub category: String,
    pub color: String,
}

impl NewCodeFields {
    pub fn to_code(&self) -> Code {
        fn optional(value: &str) -> Option<String> {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        }
        Code {
            name: self.name.trim().to_string(),
            definition: optional(&self.definition),
            description: optional(&self.description),
            category: optional(&self.category),
            color: optional(&self.color),
        }
    }
}

/// Where the user is in turning a selection into a record.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AnnotationPhase {
    #[default]
    Idle,
    Captured,
    CommentPending(CommentDraft),
    CodePending(CodeDraft),
    /// Nested "create a code" form; `resume` is the code form to return to.
    CreatingCode {
        resume: Option<CodeDraft>,
        fields: NewCodeFields,
    },
}

//=========================================================================================
// Actions and Errors
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    OpenProject(ProjectId),
    LoadProjectSuccess(ProjectSnapshot),
    DocumentsReplaced(Vec<Document>),
    DocumentSelected {
        document: ActiveDocument,
        segments: Option<Vec<Segment>>,
    },
    DocumentDeleted(DocumentId),
    SelectionCaptured {
        candidate: SelectionCandidate,
        anchor: Point,
    },
    ToolbarHidden,
    CommentStarted,
    CommentEdited(String),
    CodeAssignmentStarted,
    CodeChosen(String),
    CodeCreationStarted,
    CodeFieldsEdited(NewCodeFields),
    CodeCreationCancelled,
    CodeCreated(Code),
    CommentCommitted(Comment),
    CodeAssignmentCommitted(CodeAssignment),
    AnnotationDiscarded,
    FilesStaged(Vec<StagedFile>),
    StagedFileRemoved(String),
    StagedFilesCleared,
    Notified {
        level: NotificationLevel,
        message: String,
    },
    NotificationDismissed(u64),
    AuthRequired,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("no active selection")]
    NoSelection,
    #[error("no code chosen")]
    NoCodeChosen,
    #[error("code '{0}' is not in the codebook")]
    UnknownCode(String),
    #[error("code '{0}' is not the code chosen in the form")]
    CodeMismatch(String),
    #[error("quoted text does not match the active selection")]
    TextMismatch,
    #[error("comment body is empty")]
    EmptyComment,
    #[error("code name is empty")]
    EmptyCodeName,
    #[error("{action} is not allowed while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },
}

//=========================================================================================
// The Store
//=========================================================================================

#[derive(Debug, Default)]
pub struct Store {
    project_id: Option<ProjectId>,
    project: Option<ProjectSummary>,
    documents: Vec<Document>,
    codes: Vec<Code>,
    comments: Vec<Comment>,
    code_assignments: Vec<CodeAssignment>,
    active_document: Option<ActiveDocument>,
    active_segments: Option<Vec<Segment>>,
    selection: Option<SelectionCandidate>,
    toolbar: Toolbar,
    phase: AnnotationPhase,
    staged_files: Vec<StagedFile>,
    notifications: Vec<Notification>,
    next_notification: u64,
    view: View,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_project(project_id: ProjectId) -> Self {
        Self {
            project_id: Some(project_id),
            ..Self::default()
        }
    }

    // --- Selectors ---

    pub fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    pub fn project(&self) -> Option<&ProjectSummary> {
        self.project.as_ref()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn codes(&self) -> &[Code] {
        &self.codes
    }

    pub fn has_code(&self, name: &str) -> bool {
        self.codes.iter().any(|c| c.name == name)
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn code_assignments(&self) -> &[CodeAssignment] {
        &self.code_assignments
    }

    pub fn active_document(&self) -> Option<&ActiveDocument> {
        self.active_document.as_ref()
    }

    pub fn active_segments(&self) -> Option<&[Segment]> {
        self.active_segments.as_deref()
    }

    pub fn selection(&self) -> Option<&SelectionCandidate> {
        self.selection.as_ref()
    }

    pub fn toolbar(&self) -> Toolbar {
        self.toolbar
    }

    pub fn phase(&self) -> &AnnotationPhase {
        &self.phase
    }

    pub fn staged_files(&self) -> &[StagedFile] {
        &self.staged_files
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn view(&self) -> View {
        self.view
    }

    // --- Reducer ---

    pub fn dispatch(&mut self, action: Action) -> Result<(), StoreError> {
        debug!(action = action_name(&action), "dispatch");
        match action {
            Action::OpenProject(project_id) => {
                if self.project_id != Some(project_id) {
                    *self = Self::for_project(project_id);
                }
            }
            Action::LoadProjectSuccess(snapshot) => self.apply_snapshot(snapshot),
            Action::DocumentsReplaced(documents) => {
                self.documents = documents;
                self.reconcile_active_document();
            }
            Action::DocumentSelected { document, segments } => {
                self.active_document = Some(document);
                self.active_segments = segments;
            }
            Action::DocumentDeleted(id) => {
                if self.active_document.as_ref().map(|d| d.id) == Some(id) {
                    self.active_document = None;
                    self.active_segments = None;
                    self.toolbar = Toolbar::default();
                    if self.selection.as_ref().map(|s| s.document_id) == Some(id) {
                        self.selection = None;
                    }
                    if self.phase == AnnotationPhase::Captured {
                        self.phase = AnnotationPhase::Idle;
                    }
                }
            }
            Action::SelectionCaptured { candidate, anchor } => {
                self.selection = Some(candidate);
                self.toolbar = Toolbar {
                    visible: true,
                    anchor: Some(anchor),
                };
                // An open form keeps the candidate it was opened with.
                if matches!(self.phase, AnnotationPhase::Idle | AnnotationPhase::Captured) {
                    self.phase = AnnotationPhase::Captured;
                }
            }
            Action::ToolbarHidden => {
                self.toolbar = Toolbar::default();
            }
            Action::CommentStarted => {
                let candidate = match (&self.phase, &self.selection) {
                    (AnnotationPhase::Captured, Some(candidate)) => candidate.clone(),
                    (AnnotationPhase::Captured, None) => return Err(StoreError::NoSelection),
                    (phase, _) => return Err(invalid("CommentStarted", phase)),
                };
                self.toolbar = Toolbar::default();
                self.phase = AnnotationPhase::CommentPending(CommentDraft {
                    candidate: Some(candidate),
                    body: String::new(),
                });
            }
            Action::CommentEdited(body) => match &mut self.phase {
                AnnotationPhase::CommentPending(draft) => draft.body = body,
                phase => return Err(invalid("CommentEdited", phase)),
            },
            Action::CodeAssignmentStarted => {
                if !matches!(self.phase, AnnotationPhase::Idle | AnnotationPhase::Captured) {
                    return Err(invalid("CodeAssignmentStarted", &self.phase));
                }
                self.toolbar = Toolbar::default();
                self.phase = AnnotationPhase::CodePending(CodeDraft {
                    candidate: self.selection.clone(),
                    chosen: None,
                });
            }
            Action::CodeChosen(name) => {
                if !self.has_code(&name) {
                    return Err(StoreError::UnknownCode(name));
                }
                match &mut self.phase {
                    AnnotationPhase::CodePending(draft) => draft.chosen = Some(name),
                    phase => return Err(invalid("CodeChosen", phase)),
                }
            }
            Action::CodeCreationStarted => {
                let resume = match &self.phase {
                    AnnotationPhase::CodePending(draft) => Some(draft.clone()),
                    AnnotationPhase::Idle | AnnotationPhase::Captured => None,
                    phase => return Err(invalid("CodeCreationStarted", phase)),
                };
                self.phase = AnnotationPhase::CreatingCode {
                    resume,
                    fields: NewCodeFields::default(),
                };
            }
            Action::CodeFieldsEdited(new_fields) => match &mut self.phase {
                AnnotationPhase::CreatingCode { fields, .. } => *fields = new_fields,
                phase => return Err(invalid("CodeFieldsEdited", phase)),
            },
            Action::CodeCreationCancelled => {
                let resume = match &mut self.phase {
                    AnnotationPhase::CreatingCode { resume, .. } => resume.take(),
                    phase => return Err(invalid("CodeCreationCancelled", phase)),
                };
                self.phase = self.phase_after_code_form(resume);
            }
            Action::CodeCreated(code) => {
                if code.name.trim().is_empty() {
                    return Err(StoreError::EmptyCodeName);
                }
                let resume = match &mut self.phase {
                    AnnotationPhase::CreatingCode { resume, .. } => resume.take(),
                    phase => return Err(invalid("CodeCreated", phase)),
                };
                let name = code.name.clone();
                self.codes.push(code);
                self.phase = match resume {
                    Some(draft) => AnnotationPhase::CodePending(CodeDraft {
                        chosen: Some(name),
                        ..draft
                    }),
                    None => self.phase_after_code_form(None),
                };
            }
            Action::CommentCommitted(comment) => {
                let draft = match &self.phase {
                    AnnotationPhase::CommentPending(draft) => draft,
                    phase => return Err(invalid("CommentCommitted", phase)),
                };
                let candidate = draft.candidate.as_ref().ok_or(StoreError::NoSelection)?;
                if comment.selected_text != candidate.text {
                    return Err(StoreError::TextMismatch);
                }
                if comment.comment.trim().is_empty() {
                    return Err(StoreError::EmptyComment);
                }
                self.comments.push(comment);
                self.finish_annotation();
            }
            Action::CodeAssignmentCommitted(assignment) => {
                let draft = match &self.phase {
                    AnnotationPhase::CodePending(draft) => draft,
                    phase => return Err(invalid("CodeAssignmentCommitted", phase)),
                };
                let candidate = draft.candidate.as_ref().ok_or(StoreError::NoSelection)?;
                match draft.chosen.as_deref() {
                    None => return Err(StoreError::NoCodeChosen),
                    Some(chosen) if chosen != assignment.code => {
                        return Err(StoreError::CodeMismatch(assignment.code))
                    }
                    Some(_) => {}
                }
                if assignment.selected_text != candidate.text {
                    return Err(StoreError::TextMismatch);
                }
                if !self.has_code(&assignment.code) {
                    return Err(StoreError::UnknownCode(assignment.code));
                }
                self.code_assignments.push(assignment);
                self.finish_annotation();
            }
            Action::AnnotationDiscarded => self.finish_annotation(),
            Action::FilesStaged(files) => self.staged_files.extend(files),
            Action::StagedFileRemoved(name) => self.staged_files.retain(|f| f.file_name != name),
            Action::StagedFilesCleared => self.staged_files.clear(),
            Action::Notified { level, message } => {
                self.next_notification += 1;
                self.notifications.push(Notification {
                    id: self.next_notification,
                    level,
                    message,
                });
            }
            Action::NotificationDismissed(id) => self.notifications.retain(|n| n.id != id),
            Action::AuthRequired => self.view = View::Login,
        }
        Ok(())
    }

    fn apply_snapshot(&mut self, snapshot: ProjectSnapshot) {
        // A snapshot only arrives for an authenticated session.
        self.view = View::Workspace;
        self.project_id = Some(snapshot.summary.id);
        self.project = Some(snapshot.summary);

        match snapshot.documents {
            Some(documents) => {
                self.documents = documents;
                self.reconcile_active_document();
            }
            None => warn!("Project snapshot has no documents field; keeping local documents."),
        }
        match snapshot.codes {
            Some(codes) => self.codes = codes,
            None => warn!("Project snapshot has no codes field; keeping local codes."),
        }
        match snapshot.code_assignments {
            Some(assignments) => self.code_assignments = assignments,
            None => warn!("Project snapshot has no code_assignments field; keeping local assignments."),
        }
        match snapshot.comments {
            Some(comments) => self.comments = comments,
            None => warn!("Project snapshot has no annotations field; keeping local comments."),
        }
    }

    /// Re-points the active document at the freshly loaded collection.
    fn reconcile_active_document(&mut self) {
        let Some(active) = &self.active_document else {
            return;
        };
        match self.documents.iter().find(|d| d.id == active.id) {
            Some(document) => {
                self.active_document = Some(ActiveDocument::from(document));
                match &document.segments {
                    Some(segments) => self.active_segments = Some(segments.clone()),
                    None => {
                        warn!(
                            "Document {} still has no segments after a refresh.",
                            document.id
                        );
                        self.active_segments.get_or_insert_with(Vec::new);
                    }
                }
            }
            None => {
                debug!("Active document {} is gone; clearing it.", active.id);
                self.active_document = None;
                self.active_segments = None;
            }
        }
    }

    fn finish_annotation(&mut self) {
        self.phase = AnnotationPhase::Idle;
        self.selection = None;
        self.toolbar = Toolbar::default();
    }

    fn phase_after_code_form(&self, resume: Option<CodeDraft>) -> AnnotationPhase {
        match resume {
            Some(draft) => AnnotationPhase::CodePending(draft),
            None if self.selection.is_some() => AnnotationPhase::Captured,
            None => AnnotationPhase::Idle,
        }
    }
}

fn phase_name(phase: &AnnotationPhase) -> &'static str {
    match phase {
        AnnotationPhase::Idle => "idle",
        AnnotationPhase::Captured => "captured",
        AnnotationPhase::CommentPending(_) => "comment pending",
        AnnotationPhase::CodePending(_) => "code pending",
        AnnotationPhase::CreatingCode { .. } => "creating a code",
    }
}

fn invalid(action: &'static str, phase: &AnnotationPhase) -> StoreError {
    StoreError::InvalidTransition {
        action,
        phase: phase_name(phase),
    }
}

fn action_name(action: &Action) -> &'static str {
    match action {
        Action::OpenProject(_) => "OPEN_PROJECT",
        Action::LoadProjectSuccess(_) => "LOAD_PROJECT_SUCCESS",
        Action::DocumentsReplaced(_) => "DOCUMENTS_REPLACED",
        Action::DocumentSelected { .. } => "DOCUMENT_SELECTED",
        Action::DocumentDeleted(_) => "DOCUMENT_DELETED",
        Action::SelectionCaptured { .. } => "SELECTION_CAPTURED",
        Action::ToolbarHidden => "TOOLBAR_HIDDEN",
        Action::CommentStarted => "COMMENT_STARTED",
        Action::CommentEdited(_) => "COMMENT_EDITED",
        Action::CodeAssignmentStarted => "CODE_ASSIGNMENT_STARTED",
        Action::CodeChosen(_) => "CODE_CHOSEN",
        Action::CodeCreationStarted => "CODE_CREATION_STARTED",
        Action::CodeFieldsEdited(_) => "CODE_FIELDS_EDITED",
        Action::CodeCreationCancelled => "CODE_CREATION_CANCELLED",
        Action::CodeCreated(_) => "CODE_CREATED",
        Action::CommentCommitted(_) => "COMMENT_COMMITTED",
        Action::CodeAssignmentCommitted(_) => "CODE_ASSIGNMENT_COMMITTED",
        Action::AnnotationDiscarded => "ANNOTATION_DISCARDED",
        Action::FilesStaged(_) => "FILES_STAGED",
        Action::StagedFileRemoved(_) => "STAGED_FILE_REMOVED",
        Action::StagedFilesCleared => "STAGED_FILES_CLEARED",
        Action::Notified { .. } => "NOTIFIED",
        Action::NotificationDismissed(_) => "NOTIFICATION_DISMISSED",
        Action::AuthRequired => "AUTH_REQUIRED",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn document(id: DocumentId, segments: Option<Vec<Segment>>) -> Document {
        Document {
            id,
            name: format!("doc{id}.txt"),
            document_type: "text".to_string(),
            file_size: Some(10),
            segments,
        }
    }

    fn snapshot(documents: Option<Vec<Document>>, codes: Option<Vec<Code>>) -> ProjectSnapshot {
        ProjectSnapshot {
            summary: ProjectSummary {
                id: 42,
                title: "Study".to_string(),
                description: String::new(),
            },
            documents,
            codes,
            code_assignments: Some(Vec::new()),
            comments: Some(Vec::new()),
        }
    }

    fn candidate(text: &str) -> SelectionCandidate {
        SelectionCandidate {
            text: text.to_string(),
            document_id: 1,
            document_name: "doc1.txt".to_string(),
            context: String::new(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn absent_snapshot_fields_keep_local_collections() {
        let mut store = Store::for_project(42);
        store
            .dispatch(Action::LoadProjectSuccess(snapshot(
                Some(vec![document(1, Some(Vec::new()))]),
                Some(vec![Code::named("Emotions")]),
            )))
            .unwrap();

        store
            .dispatch(Action::LoadProjectSuccess(snapshot(None, None)))
            .unwrap();

        assert_eq!(store.documents().len(), 1);
        assert!(store.has_code("Emotions"));
    }

    #[test]
    fn refresh_clears_an_active_document_that_disappeared() {
        let mut store = Store::for_project(42);
        store
            .dispatch(Action::DocumentSelected {
                document: ActiveDocument {
                    id: 7,
                    name: "gone.txt".to_string(),
                },
                segments: Some(Vec::new()),
            })
            .unwrap();

        store
            .dispatch(Action::LoadProjectSuccess(snapshot(
                Some(vec![document(1, None)]),
                None,
            )))
            .unwrap();

        assert!(store.active_document().is_none());
        assert!(store.active_segments().is_none());
    }

    #[test]
    fn comment_cannot_start_without_a_capture() {
        let mut store = Store::new();
        let err = store.dispatch(Action::CommentStarted).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
        assert_eq!(store.phase(), &AnnotationPhase::Idle);
    }

    #[test]
    fn rejected_commit_leaves_state_untouched() {
        let mut store = Store::new();
        store
            .dispatch(Action::SelectionCaptured {
                candidate: candidate("I felt anxious"),
                anchor: Point::default(),
            })
            .unwrap();
        store.dispatch(Action::CommentStarted).unwrap();
        let before = store.phase().clone();

        let err = store
            .dispatch(Action::CommentCommitted(Comment {
                id: 1,
                document_id: Some(1),
                document_name: "doc1.txt".to_string(),
                selected_text: "I felt".to_string(),
                comment: "worth a follow-up".to_string(),
                timestamp: Utc::now(),
                page_context: String::new(),
            }))
            .unwrap_err();

        assert_eq!(err, StoreError::TextMismatch);
        assert_eq!(store.phase(), &before);
        assert!(store.comments().is_empty());
    }

    #[test]
    fn new_selection_does_not_replace_an_open_form_candidate() {
        let mut store = Store::new();
        store
            .dispatch(Action::SelectionCaptured {
                candidate: candidate("first"),
                anchor: Point::default(),
            })
            .unwrap();
        store.dispatch(Action::CodeAssignmentStarted).unwrap();
        store
            .dispatch(Action::SelectionCaptured {
                candidate: candidate("second"),
                anchor: Point::default(),
            })
            .unwrap();

        match store.phase() {
            AnnotationPhase::CodePending(draft) => {
                assert_eq!(draft.candidate.as_ref().unwrap().text, "first")
            }
            other => panic!("unexpected phase {other:?}"),
        }
    }

    #[test]
    fn staged_files_are_removed_by_name() {
        let mut store = Store::new();
        store
            .dispatch(Action::FilesStaged(vec![
                StagedFile::new("a.txt", "a"),
                StagedFile::new("b.txt", "b"),
            ]))
            .unwrap();
        store
            .dispatch(Action::StagedFileRemoved("a.txt".to_string()))
            .unwrap();
        assert_eq!(store.staged_files().len(), 1);
        assert_eq!(store.staged_files()[0].file_name, "b.txt");
        store.dispatch(Action::StagedFilesCleared).unwrap();
        assert!(store.staged_files().is_empty());
    }

    #[test]
    fn notifications_are_dismissible() {
        let mut store = Store::new();
        store
            .dispatch(Action::Notified {
                level: NotificationLevel::Error,
                message: "boom".to_string(),
            })
            .unwrap();
        let id = store.notifications()[0].id;
        store.dispatch(Action::NotificationDismissed(id)).unwrap();
        assert!(store.notifications().is_empty());
    }

    #[test]
    fn opening_another_project_starts_from_a_clean_store() {
        let mut store = Store::for_project(42);
        store
            .dispatch(Action::LoadProjectSuccess(snapshot(
                Some(vec![document(1, Some(Vec::new()))]),
                Some(vec![Code::named("Emotions")]),
            )))
            .unwrap();

        store.dispatch(Action::OpenProject(42)).unwrap();
        assert_eq!(store.documents().len(), 1);

        store.dispatch(Action::OpenProject(43)).unwrap();
        assert_eq!(store.project_id(), Some(43));
        assert!(store.project().is_none());
        assert!(store.documents().is_empty());
        assert!(store.codes().is_empty());
    }

    #[test]
    fn successful_load_returns_from_login() {
        let mut store = Store::for_project(42);
        store.dispatch(Action::AuthRequired).unwrap();
        assert_eq!(store.view(), View::Login);

        store
            .dispatch(Action::LoadProjectSuccess(snapshot(Some(Vec::new()), None)))
            .unwrap();
        assert_eq!(store.view(), View::Workspace);
    }

    #[test]
    fn committed_code_must_match_the_chosen_one() {
        let mut store = Store::for_project(42);
        store
            .dispatch(Action::LoadProjectSuccess(snapshot(
                Some(Vec::new()),
                Some(vec![Code::named("Emotions"), Code::named("Coping")]),
            )))
            .unwrap();
        store
            .dispatch(Action::SelectionCaptured {
                candidate: candidate("I felt anxious"),
                anchor: Point::default(),
            })
            .unwrap();
        store.dispatch(Action::CodeAssignmentStarted).unwrap();
        store
            .dispatch(Action::CodeChosen("Emotions".to_string()))
            .unwrap();
        let before = store.phase().clone();

        let err = store
            .dispatch(Action::CodeAssignmentCommitted(CodeAssignment {
                id: 1,
                document_name: "doc1.txt".to_string(),
                selected_text: "I felt anxious".to_string(),
                code: "Coping".to_string(),
                timestamp: Utc::now(),
                context: String::new(),
            }))
            .unwrap_err();

        assert_eq!(err, StoreError::CodeMismatch("Coping".to_string()));
        assert_eq!(store.phase(), &before);
        assert!(store.code_assignments().is_empty());
    }
}
