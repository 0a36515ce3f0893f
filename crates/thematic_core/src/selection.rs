//! crates/thematic_core/src/selection.rs
//!
//! Turns pointer events on the rendered document into selection candidates
//! and keeps the floating toolbar in step with them.

use crate::context::extract_context;
use crate::domain::SelectionCandidate;
use crate::store::{Action, Store};
use crate::surface::{NodeId, Point, Rect, SelectionSurface};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Vertical gap between the toolbar anchor and the top of the selection.
pub const TOOLBAR_OFFSET: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub target: NodeId,
    pub position: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Captured {
        candidate: SelectionCandidate,
        anchor: Point,
    },
    /// The selection collapsed; the toolbar was hidden.
    Hidden,
    /// Nothing to do (toolbar click, no active document, no selection API).
    Ignored,
}

/// Above the selection, horizontally centred. Never above the viewport top.
pub fn toolbar_anchor(bounds: Rect) -> Point {
    Point {
        x: bounds.left + bounds.width / 2.0,
        y: (bounds.top - TOOLBAR_OFFSET).max(0.0),
    }
}

/// Pointer released inside document content.
pub fn handle_pointer_up<S>(
    store: &mut Store,
    surface: &mut S,
    event: &PointerEvent,
    now: DateTime<Utc>,
) -> CaptureOutcome
where
    S: SelectionSurface + ?Sized,
{
    // The toolbar's own buttons release the pointer too.
    if surface.toolbar_contains(event.target) {
        return CaptureOutcome::Ignored;
    }

    let Some(selection) = surface.selection() else {
        debug!("No selection API on this surface.");
        return CaptureOutcome::Ignored;
    };

    let text = selection.text.trim();
    if text.is_empty() || selection.ranges.is_empty() {
        if selection.ranges.is_empty() && !text.is_empty() {
            debug!("Selection text reported without ranges; treating as no selection.");
        }
        surface.hide_toolbar();
        apply(store, Action::ToolbarHidden);
        return CaptureOutcome::Hidden;
    }

    let Some(active) = store.active_document().cloned() else {
        debug!("Text selected with no active document; ignoring.");
        return CaptureOutcome::Ignored;
    };

    let first = &selection.ranges[0];
    let anchor = toolbar_anchor(first.bounds);
    let candidate = SelectionCandidate {
        text: selection.text.clone(),
        document_id: active.id,
        document_name: active.name,
        context: extract_context(&*surface, first),
        timestamp: now,
    };

    surface.show_toolbar(anchor);
    apply(
        store,
        Action::SelectionCaptured {
            candidate: candidate.clone(),
            anchor,
        },
    );
    CaptureOutcome::Captured { candidate, anchor }
}

/// Pointer pressed anywhere. Hides the toolbar when the press lands outside it.
/// Returns whether the toolbar was hidden.
pub fn handle_pointer_down<S>(store: &mut Store, surface: &mut S, event: &PointerEvent) -> bool
where
    S: SelectionSurface + ?Sized,
{
    if !store.toolbar().visible {
        return false;
    }
    let inside = surface.toolbar_contains(event.target)
        || surface
            .toolbar_bounds()
            .is_some_and(|bounds| bounds.contains(event.position));
    if inside {
        return false;
    }
    surface.hide_toolbar();
    apply(store, Action::ToolbarHidden);
    true
}

fn apply(store: &mut Store, action: Action) {
    if let Err(e) = store.dispatch(action) {
        warn!("Selection action rejected: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Segment;
    use crate::store::{ActiveDocument, AnnotationPhase};
    use crate::surface::{PlatformSelection, TextSurface, CHAR_WIDTH};

    fn rendered() -> (Store, TextSurface) {
        let segments = vec![
            Segment {
                id: 1,
                content: "Interviewer: How was it?".to_string(),
                segment_type: Some("line".to_string()),
                line_number: Some(1),
                is_coded: false,
                code_names: Vec::new(),
            },
            Segment {
                id: 2,
                content: "Participant: I felt anxious at first.".to_string(),
                segment_type: Some("line".to_string()),
                line_number: Some(2),
                is_coded: false,
                code_names: Vec::new(),
            },
        ];
        let mut store = Store::for_project(42);
        store
            .dispatch(Action::DocumentSelected {
                document: ActiveDocument {
                    id: 1,
                    name: "interview1.txt".to_string(),
                },
                segments: Some(segments.clone()),
            })
            .unwrap();
        (store, TextSurface::render(&segments))
    }

    fn up_on(target: NodeId) -> PointerEvent {
        PointerEvent {
            target,
            position: Point::default(),
        }
    }

    #[test]
    fn release_over_selected_text_captures_a_candidate() {
        let (mut store, mut surface) = rendered();
        surface.select_in(1, 13, 27).unwrap();
        let target = surface.line(1).unwrap();

        let outcome = handle_pointer_up(&mut store, &mut surface, &up_on(target), Utc::now());

        let CaptureOutcome::Captured { candidate, anchor } = outcome else {
            panic!("expected a capture, got {outcome:?}");
        };
        assert_eq!(candidate.text, "I felt anxious");
        assert_eq!(candidate.document_name, "interview1.txt");
        assert_eq!(candidate.context, "Participant: I felt anxious at first.");
        // Second line sits less than one offset below the top, so the anchor clamps.
        assert_eq!(anchor, Point { x: 13.0 * CHAR_WIDTH + 7.0 * CHAR_WIDTH, y: 0.0 });
        assert!(surface.is_toolbar_visible());
        assert_eq!(store.phase(), &AnnotationPhase::Captured);
        assert_eq!(store.selection(), Some(&candidate));
    }

    #[test]
    fn anchor_is_centred_and_clamped_to_the_top() {
        let anchor = toolbar_anchor(Rect {
            left: 100.0,
            top: 10.0,
            width: 40.0,
            height: 24.0,
        });
        assert_eq!(anchor, Point { x: 120.0, y: 0.0 });
    }

    #[test]
    fn anchor_sits_one_offset_above_the_selection() {
        let anchor = toolbar_anchor(Rect {
            left: 100.0,
            top: 200.0,
            width: 40.0,
            height: 24.0,
        });
        assert_eq!(anchor, Point { x: 120.0, y: 150.0 });
        assert_eq!(anchor.y, 200.0 - TOOLBAR_OFFSET);
    }

    #[test]
    fn empty_release_hides_toolbar_but_keeps_candidate() {
        let (mut store, mut surface) = rendered();
        surface.select_in(1, 13, 27).unwrap();
        let target = surface.line(1).unwrap();
        handle_pointer_up(&mut store, &mut surface, &up_on(target), Utc::now());

        surface.clear_selection();
        let outcome = handle_pointer_up(&mut store, &mut surface, &up_on(target), Utc::now());

        assert_eq!(outcome, CaptureOutcome::Hidden);
        assert!(!store.toolbar().visible);
        assert!(store.selection().is_some());
    }

    #[test]
    fn release_on_toolbar_button_is_ignored() {
        let (mut store, mut surface) = rendered();
        surface.select_in(1, 13, 27).unwrap();
        let target = surface.line(1).unwrap();
        handle_pointer_up(&mut store, &mut surface, &up_on(target), Utc::now());

        surface.clear_selection();
        let button = surface.assign_code_button();
        let outcome = handle_pointer_up(&mut store, &mut surface, &up_on(button), Utc::now());

        assert_eq!(outcome, CaptureOutcome::Ignored);
        assert!(store.toolbar().visible);
    }

    #[test]
    fn whitespace_only_selection_counts_as_empty() {
        let (mut store, mut surface) = rendered();
        surface.set_selection(Some(PlatformSelection {
            text: "   ".to_string(),
            ranges: Vec::new(),
        }));
        let target = surface.line(0).unwrap();
        let outcome = handle_pointer_up(&mut store, &mut surface, &up_on(target), Utc::now());
        assert_eq!(outcome, CaptureOutcome::Hidden);
        assert!(store.selection().is_none());
    }

    #[test]
    fn zero_range_selection_is_no_selection() {
        let (mut store, mut surface) = rendered();
        surface.set_selection(Some(PlatformSelection {
            text: "ghost".to_string(),
            ranges: Vec::new(),
        }));
        let target = surface.line(0).unwrap();
        let outcome = handle_pointer_up(&mut store, &mut surface, &up_on(target), Utc::now());
        assert_eq!(outcome, CaptureOutcome::Hidden);
        assert!(store.selection().is_none());
    }

    #[test]
    fn missing_selection_api_is_a_silent_no_op() {
        let (mut store, surface) = rendered();
        let mut surface = surface.without_selection_api();
        let target = surface.line(0).unwrap();
        let outcome = handle_pointer_up(&mut store, &mut surface, &up_on(target), Utc::now());
        assert_eq!(outcome, CaptureOutcome::Ignored);
    }

    #[test]
    fn selection_without_active_document_is_ignored() {
        let segments = vec![Segment {
            id: 1,
            content: "loose text".to_string(),
            segment_type: None,
            line_number: None,
            is_coded: false,
            code_names: Vec::new(),
        }];
        let mut store = Store::new();
        let mut surface = TextSurface::render(&segments);
        surface.select_in(0, 0, 5).unwrap();
        let target = surface.line(0).unwrap();

        let outcome = handle_pointer_up(&mut store, &mut surface, &up_on(target), Utc::now());
        assert_eq!(outcome, CaptureOutcome::Ignored);
        assert!(store.selection().is_none());
    }

    #[test]
    fn press_outside_hides_and_press_inside_keeps_toolbar() {
        let (mut store, mut surface) = rendered();
        surface.select_in(1, 13, 27).unwrap();
        let line = surface.line(1).unwrap();
        handle_pointer_up(&mut store, &mut surface, &up_on(line), Utc::now());

        let button = surface.add_comment_button();
        assert!(!handle_pointer_down(&mut store, &mut surface, &up_on(button)));
        assert!(store.toolbar().visible);

        let far_away = PointerEvent {
            target: surface.line(0).unwrap(),
            position: Point { x: 900.0, y: 900.0 },
        };
        assert!(handle_pointer_down(&mut store, &mut surface, &far_away));
        assert!(!store.toolbar().visible);
        assert!(!surface.is_toolbar_visible());
    }
}
