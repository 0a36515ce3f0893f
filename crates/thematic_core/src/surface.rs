//! crates/thematic_core/src/surface.rs
//!
//! The rendering-surface capability the selection pipeline is written against.
//!
//! A browser shell implements `SelectionSurface` over its DOM; `TextSurface` is
//! an in-memory implementation that lays a document's segments out as one
//! block per segment on a fixed character grid. The CLI and the tests drive the
//! pipeline through it.

use crate::domain::Segment;

/// Opaque handle to a node of the rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x <= self.right()
            && point.y >= self.top
            && point.y <= self.bottom()
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        Rect {
            left,
            top,
            width: self.right().max(other.right()) - left,
            height: self.bottom().max(other.bottom()) - top,
        }
    }
}

/// One contiguous range of a platform selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRange {
    /// Deepest node containing the whole range.
    pub container: NodeId,
    pub bounds: Rect,
}

/// The platform's active selection as reported by the surface.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlatformSelection {
    pub text: String,
    pub ranges: Vec<SelectionRange>,
}

/// Capability interface over whatever renders the document content.
pub trait SelectionSurface {
    /// `None` when the platform exposes no selection API at all.
    fn selection(&self) -> Option<PlatformSelection>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn is_block(&self, node: NodeId) -> bool;

    fn text_content(&self, node: NodeId) -> Option<String>;

    /// True when `node` is the floating toolbar or one of its descendants.
    fn toolbar_contains(&self, node: NodeId) -> bool;

    /// Bounds of the toolbar while it is shown.
    fn toolbar_bounds(&self) -> Option<Rect>;

    fn show_toolbar(&mut self, anchor: Point);

    fn hide_toolbar(&mut self);
}

//=========================================================================================
// In-memory Text Surface
//=========================================================================================

pub const CHAR_WIDTH: f64 = 8.0;
pub const LINE_HEIGHT: f64 = 24.0;
pub const TOOLBAR_WIDTH: f64 = 160.0;
pub const TOOLBAR_HEIGHT: f64 = 36.0;

#[derive(Debug, Clone)]
enum NodeKind {
    Root,
    Block,
    Text(String),
    Toolbar,
    Button,
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    kind: NodeKind,
}

/// A position inside the rendered document: segment index plus char offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPosition {
    pub segment: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("selection {start:?}..{end:?} is outside the rendered document")]
pub struct OutOfRange {
    pub start: TextPosition,
    pub end: TextPosition,
}

#[derive(Debug, Clone)]
pub struct TextSurface {
    nodes: Vec<Node>,
    root: NodeId,
    /// Text node per rendered segment, in render order.
    lines: Vec<NodeId>,
    toolbar: NodeId,
    add_comment_button: NodeId,
    assign_code_button: NodeId,
    toolbar_bounds: Option<Rect>,
    selection: Option<PlatformSelection>,
    selection_api: bool,
}

impl TextSurface {
    /// Renders segments in the order given, one block each.
    pub fn render(segments: &[Segment]) -> Self {
        let mut nodes = vec![Node {
            parent: None,
            kind: NodeKind::Root,
        }];
        let root = NodeId(0);
        let mut lines = Vec::with_capacity(segments.len());

        for segment in segments {
            let block = push_node(&mut nodes, Some(root), NodeKind::Block);
            let text = push_node(&mut nodes, Some(block), NodeKind::Text(segment.content.clone()));
            lines.push(text);
        }

        // The toolbar lives outside the document root, like a portal.
        let toolbar = push_node(&mut nodes, None, NodeKind::Toolbar);
        let add_comment_button = push_node(&mut nodes, Some(toolbar), NodeKind::Button);
        let assign_code_button = push_node(&mut nodes, Some(toolbar), NodeKind::Button);

        Self {
            nodes,
            root,
            lines,
            toolbar,
            add_comment_button,
            assign_code_button,
            toolbar_bounds: None,
            selection: None,
            selection_api: true,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn line(&self, segment: usize) -> Option<NodeId> {
        self.lines.get(segment).copied()
    }

    pub fn add_comment_button(&self) -> NodeId {
        self.add_comment_button
    }

    pub fn assign_code_button(&self) -> NodeId {
        self.assign_code_button
    }

    /// Screen bounds of the given line, if it exists.
    pub fn line_bounds(&self, segment: usize) -> Option<Rect> {
        let text = self.line_text(segment)?;
        Some(Rect {
            left: 0.0,
            top: segment as f64 * LINE_HEIGHT,
            width: text.chars().count() as f64 * CHAR_WIDTH,
            height: LINE_HEIGHT,
        })
    }

    /// Selects the characters `start..end` of one segment.
    pub fn select_in(&mut self, segment: usize, start: usize, end: usize) -> Result<(), OutOfRange> {
        self.select(
            TextPosition { segment, offset: start },
            TextPosition { segment, offset: end },
        )
    }

    /// Selects from `start` up to (excluding) `end`, possibly across segments.
    pub fn select(&mut self, start: TextPosition, end: TextPosition) -> Result<(), OutOfRange> {
        let out_of_range = OutOfRange { start, end };
        if (end.segment, end.offset) < (start.segment, start.offset) {
            return Err(out_of_range);
        }

        let mut pieces = Vec::new();
        let mut bounds: Option<Rect> = None;
        for segment in start.segment..=end.segment {
            let line = self.line_text(segment).ok_or(out_of_range.clone())?;
            let len = line.chars().count();
            let from = if segment == start.segment { start.offset } else { 0 };
            let to = if segment == end.segment { end.offset } else { len };
            if from > len || to > len {
                return Err(out_of_range);
            }

            pieces.push(line.chars().skip(from).take(to - from).collect::<String>());
            let rect = Rect {
                left: from as f64 * CHAR_WIDTH,
                top: segment as f64 * LINE_HEIGHT,
                width: (to - from) as f64 * CHAR_WIDTH,
                height: LINE_HEIGHT,
            };
            bounds = Some(match bounds {
                Some(acc) => acc.union(&rect),
                None => rect,
            });
        }

        let container = if start.segment == end.segment {
            self.lines[start.segment]
        } else {
            self.root
        };

        self.selection = Some(PlatformSelection {
            text: pieces.join("\n"),
            ranges: vec![SelectionRange {
                container,
                bounds: bounds.unwrap_or_default(),
            }],
        });
        Ok(())
    }

    /// Collapses the selection to a caret: empty text, no ranges.
    pub fn clear_selection(&mut self) {
        self.selection = Some(PlatformSelection::default());
    }

    /// Overrides what the platform reports, for hosts with odd selection models.
    pub fn set_selection(&mut self, selection: Option<PlatformSelection>) {
        self.selection = selection;
    }

    /// Simulates a host without a selection API.
    pub fn without_selection_api(mut self) -> Self {
        self.selection_api = false;
        self
    }

    pub fn is_toolbar_visible(&self) -> bool {
        self.toolbar_bounds.is_some()
    }

    fn line_text(&self, segment: usize) -> Option<&str> {
        let node = self.lines.get(segment)?;
        match &self.nodes[node.0].kind {
            NodeKind::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    fn collect_text(&self, node: NodeId, out: &mut Vec<String>) {
        if let NodeKind::Text(text) = &self.nodes[node.0].kind {
            out.push(text.clone());
            return;
        }
        for (index, child) in self.nodes.iter().enumerate() {
            if child.parent == Some(node) {
                self.collect_text(NodeId(index), out);
            }
        }
    }
}

fn push_node(nodes: &mut Vec<Node>, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
    nodes.push(Node { parent, kind });
    NodeId(nodes.len() - 1)
}

impl SelectionSurface for TextSurface {
    fn selection(&self) -> Option<PlatformSelection> {
        if !self.selection_api {
            return None;
        }
        self.selection.clone()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    fn is_block(&self, node: NodeId) -> bool {
        matches!(
            self.nodes.get(node.0).map(|n| &n.kind),
            Some(NodeKind::Block)
        )
    }

    fn text_content(&self, node: NodeId) -> Option<String> {
        self.nodes.get(node.0)?;
        let mut pieces = Vec::new();
        self.collect_text(node, &mut pieces);
        if pieces.is_empty() {
            return None;
        }
        Some(pieces.join("\n"))
    }

    fn toolbar_contains(&self, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == self.toolbar {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    fn toolbar_bounds(&self) -> Option<Rect> {
        self.toolbar_bounds
    }

    fn show_toolbar(&mut self, anchor: Point) {
        self.toolbar_bounds = Some(Rect {
            left: anchor.x - TOOLBAR_WIDTH / 2.0,
            top: anchor.y,
            width: TOOLBAR_WIDTH,
            height: TOOLBAR_HEIGHT,
        });
    }

    fn hide_toolbar(&mut self) {
        self.toolbar_bounds = None;
    }
}
