//! crates/thematic_core/src/context.rs
//!
//! Best-effort surrounding text for a selection: the text of the nearest
//! enclosing block, falling back to the parent element and finally to the
//! range's own container. Read-only with respect to the surface.

use crate::surface::{SelectionRange, SelectionSurface};

pub fn extract_context<S>(surface: &S, range: &SelectionRange) -> String
where
    S: SelectionSurface + ?Sized,
{
    let mut cursor = Some(range.container);
    while let Some(node) = cursor {
        if surface.is_block(node) {
            return surface.text_content(node).unwrap_or_default();
        }
        cursor = surface.parent(node);
    }

    let source = surface.parent(range.container).unwrap_or(range.container);
    surface.text_content(source).unwrap_or_default()
}
