//! crates/thematic_core/src/annotation.rs
//!
//! Routes a captured selection into a comment or a code assignment.
//!
//! The phases live in the store (`AnnotationPhase`); this module turns user
//! intents into actions and builds the committed records, stamping them with
//! time-based local ids.

use crate::domain::{Code, CodeAssignment, Comment, LocalIds};
use crate::store::{Action, AnnotationPhase, NewCodeFields, Store, StoreError};
use chrono::{DateTime, Utc};
use tracing::info;

const UNKNOWN_DOCUMENT: &str = "Unknown Document";

#[derive(Debug, Default)]
pub struct AnnotationDispatcher {
    ids: LocalIds,
}

impl AnnotationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// "Add Comment" on the toolbar.
    pub fn add_comment(&self, store: &mut Store) -> Result<(), StoreError> {
        store.dispatch(Action::CommentStarted)
    }

    pub fn edit_comment(&self, store: &mut Store, body: impl Into<String>) -> Result<(), StoreError> {
        store.dispatch(Action::CommentEdited(body.into()))
    }

    /// "Assign Code" on the toolbar.
    pub fn assign_code(&self, store: &mut Store) -> Result<(), StoreError> {
        store.dispatch(Action::CodeAssignmentStarted)
    }

    pub fn choose_code(&self, store: &mut Store, name: impl Into<String>) -> Result<(), StoreError> {
        store.dispatch(Action::CodeChosen(name.into()))
    }

    /// "Create new code", either from the code form or standalone.
    pub fn start_new_code(&self, store: &mut Store) -> Result<(), StoreError> {
        store.dispatch(Action::CodeCreationStarted)
    }

    pub fn edit_new_code(&self, store: &mut Store, fields: NewCodeFields) -> Result<(), StoreError> {
        store.dispatch(Action::CodeFieldsEdited(fields))
    }

    pub fn cancel_new_code(&self, store: &mut Store) -> Result<(), StoreError> {
        store.dispatch(Action::CodeCreationCancelled)
    }

    /// Saves the "create a code" form. When it was opened from the code form,
    /// the new code is pre-selected there.
    pub fn save_new_code(&self, store: &mut Store) -> Result<Code, StoreError> {
        let code = match store.phase() {
            AnnotationPhase::CreatingCode { fields, .. } => fields.to_code(),
            _ => {
                return Err(StoreError::InvalidTransition {
                    action: "save_new_code",
                    phase: "not creating a code",
                })
            }
        };
        if code.name.is_empty() {
            return Err(StoreError::EmptyCodeName);
        }
        store.dispatch(Action::CodeCreated(code.clone()))?;
        info!("Created code '{}'.", code.name);
        Ok(code)
    }

    /// Whether the comment form's save control is enabled.
    pub fn can_save_comment(&self, store: &Store) -> bool {
        matches!(store.phase(), AnnotationPhase::CommentPending(draft) if draft.can_commit())
    }

    /// Whether the code form's assign control is enabled.
    pub fn can_save_code_assignment(&self, store: &Store) -> bool {
        matches!(store.phase(), AnnotationPhase::CodePending(draft) if draft.can_commit())
    }

    pub fn save_comment(&self, store: &mut Store, now: DateTime<Utc>) -> Result<Comment, StoreError> {
        let draft = match store.phase() {
            AnnotationPhase::CommentPending(draft) => draft,
            _ => {
                return Err(StoreError::InvalidTransition {
                    action: "save_comment",
                    phase: "no comment form open",
                })
            }
        };
        let candidate = draft.candidate.as_ref().ok_or(StoreError::NoSelection)?;
        if draft.body.trim().is_empty() {
            return Err(StoreError::EmptyComment);
        }

        let comment = Comment {
            id: self.ids.next(now),
            document_id: Some(candidate.document_id),
            document_name: document_name_or_unknown(&candidate.document_name),
            selected_text: candidate.text.clone(),
            comment: draft.body.clone(),
            timestamp: now,
            page_context: candidate.context.clone(),
        };
        store.dispatch(Action::CommentCommitted(comment.clone()))?;
        info!("Comment {} added to '{}'.", comment.id, comment.document_name);
        Ok(comment)
    }

    pub fn save_code_assignment(
        &self,
        store: &mut Store,
        now: DateTime<Utc>,
    ) -> Result<CodeAssignment, StoreError> {
        let draft = match store.phase() {
            AnnotationPhase::CodePending(draft) => draft,
            _ => {
                return Err(StoreError::InvalidTransition {
                    action: "save_code_assignment",
                    phase: "no code form open",
                })
            }
        };
        let candidate = draft.candidate.as_ref().ok_or(StoreError::NoSelection)?;
        let code = draft.chosen.clone().ok_or(StoreError::NoCodeChosen)?;

        let assignment = CodeAssignment {
            id: self.ids.next(now),
            document_name: document_name_or_unknown(&candidate.document_name),
            selected_text: candidate.text.clone(),
            code,
            timestamp: now,
            context: candidate.context.clone(),
        };
        store.dispatch(Action::CodeAssignmentCommitted(assignment.clone()))?;
        info!(
            "Code '{}' assigned in '{}'.",
            assignment.code, assignment.document_name
        );
        Ok(assignment)
    }

    /// Cancel/close from any phase. Nothing is recorded.
    pub fn discard(&self, store: &mut Store) {
        // Discarding is accepted in every phase.
        let _ = store.dispatch(Action::AnnotationDiscarded);
    }
}

fn document_name_or_unknown(name: &str) -> String {
    if name.is_empty() {
        UNKNOWN_DOCUMENT.to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProjectSnapshot, ProjectSummary, SelectionCandidate};
    use crate::surface::Point;

    fn store_with_codes(codes: &[&str]) -> Store {
        let mut store = Store::for_project(42);
        store
            .dispatch(Action::LoadProjectSuccess(ProjectSnapshot {
                summary: ProjectSummary {
                    id: 42,
                    title: "Study".to_string(),
                    description: String::new(),
                },
                documents: Some(Vec::new()),
                codes: Some(codes.iter().map(|c| Code::named(*c)).collect()),
                code_assignments: Some(Vec::new()),
                comments: Some(Vec::new()),
            }))
            .unwrap();
        store
    }

    fn capture(store: &mut Store, text: &str) {
        store
            .dispatch(Action::SelectionCaptured {
                candidate: SelectionCandidate {
                    text: text.to_string(),
                    document_id: 1,
                    document_name: "interview1.txt".to_string(),
                    context: format!("Participant: {text} at first."),
                    timestamp: Utc::now(),
                },
                anchor: Point { x: 10.0, y: 0.0 },
            })
            .unwrap();
    }

    #[test]
    fn comment_keeps_the_quoted_text_verbatim() {
        let dispatcher = AnnotationDispatcher::new();
        let mut store = store_with_codes(&[]);
        capture(&mut store, "  I felt anxious\u{2014}really ");

        dispatcher.add_comment(&mut store).unwrap();
        assert!(!dispatcher.can_save_comment(&store));
        dispatcher.edit_comment(&mut store, "follow up").unwrap();
        assert!(dispatcher.can_save_comment(&store));

        let comment = dispatcher.save_comment(&mut store, Utc::now()).unwrap();
        assert_eq!(comment.selected_text, "  I felt anxious\u{2014}really ");
        assert_eq!(store.comments(), &[comment]);
        assert!(store.selection().is_none());
        assert_eq!(store.phase(), &AnnotationPhase::Idle);
    }

    #[test]
    fn code_assignment_without_selection_is_rejected() {
        let dispatcher = AnnotationDispatcher::new();
        let mut store = store_with_codes(&["Emotions"]);

        dispatcher.assign_code(&mut store).unwrap();
        dispatcher.choose_code(&mut store, "Emotions").unwrap();
        assert!(!dispatcher.can_save_code_assignment(&store));
        assert_eq!(
            dispatcher.save_code_assignment(&mut store, Utc::now()),
            Err(StoreError::NoSelection)
        );
        assert!(store.code_assignments().is_empty());
    }

    #[test]
    fn code_assignment_without_code_is_rejected() {
        let dispatcher = AnnotationDispatcher::new();
        let mut store = store_with_codes(&["Emotions"]);
        capture(&mut store, "I felt anxious");

        dispatcher.assign_code(&mut store).unwrap();
        assert!(!dispatcher.can_save_code_assignment(&store));
        assert_eq!(
            dispatcher.save_code_assignment(&mut store, Utc::now()),
            Err(StoreError::NoCodeChosen)
        );
        assert!(store.code_assignments().is_empty());
    }

    #[test]
    fn code_assignment_without_selection_or_code_is_rejected() {
        let dispatcher = AnnotationDispatcher::new();
        let mut store = store_with_codes(&["Emotions"]);

        dispatcher.assign_code(&mut store).unwrap();
        assert!(!dispatcher.can_save_code_assignment(&store));
        assert!(dispatcher
            .save_code_assignment(&mut store, Utc::now())
            .is_err());
        assert!(store.code_assignments().is_empty());
    }

    #[test]
    fn choosing_an_unknown_code_is_rejected() {
        let dispatcher = AnnotationDispatcher::new();
        let mut store = store_with_codes(&["Emotions"]);
        capture(&mut store, "I felt anxious");
        dispatcher.assign_code(&mut store).unwrap();

        assert_eq!(
            dispatcher.choose_code(&mut store, "Coping"),
            Err(StoreError::UnknownCode("Coping".to_string()))
        );
    }

    #[test]
    fn creating_a_code_returns_to_the_code_form_with_it_selected() {
        let dispatcher = AnnotationDispatcher::new();
        let mut store = store_with_codes(&["Emotions"]);
        capture(&mut store, "I felt anxious");

        dispatcher.assign_code(&mut store).unwrap();
        dispatcher.start_new_code(&mut store).unwrap();
        dispatcher
            .edit_new_code(
                &mut store,
                NewCodeFields {
                    name: "  Anxiety ".to_string(),
                    color: "#F43F5E".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();
        let code = dispatcher.save_new_code(&mut store).unwrap();
        assert_eq!(code.name, "Anxiety");
        assert_eq!(code.color.as_deref(), Some("#F43F5E"));
        assert_eq!(code.definition, None);

        match store.phase() {
            AnnotationPhase::CodePending(draft) => {
                assert_eq!(draft.chosen.as_deref(), Some("Anxiety"));
                assert_eq!(draft.candidate.as_ref().unwrap().text, "I felt anxious");
            }
            other => panic!("unexpected phase {other:?}"),
        }

        let assignment = dispatcher.save_code_assignment(&mut store, Utc::now()).unwrap();
        assert_eq!(assignment.code, "Anxiety");
        assert_eq!(store.code_assignments().len(), 1);
    }

    #[test]
    fn blank_code_name_cannot_be_saved() {
        let dispatcher = AnnotationDispatcher::new();
        let mut store = store_with_codes(&[]);
        dispatcher.start_new_code(&mut store).unwrap();
        dispatcher
            .edit_new_code(
                &mut store,
                NewCodeFields {
                    name: "   ".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(dispatcher.save_new_code(&mut store), Err(StoreError::EmptyCodeName));
        assert!(store.codes().is_empty());
    }

    #[test]
    fn discard_from_a_form_records_nothing() {
        let dispatcher = AnnotationDispatcher::new();
        let mut store = store_with_codes(&["Emotions"]);
        capture(&mut store, "I felt anxious");
        dispatcher.add_comment(&mut store).unwrap();
        dispatcher.edit_comment(&mut store, "draft").unwrap();

        dispatcher.discard(&mut store);

        assert!(store.comments().is_empty());
        assert!(store.selection().is_none());
        assert_eq!(store.phase(), &AnnotationPhase::Idle);
    }
}
