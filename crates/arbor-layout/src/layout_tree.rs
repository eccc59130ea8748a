//! Layout Tree
//!
//! The layout tree is a parallel structure to the DOM tree. It holds one
//! box per displayed node, in DOM pre-order, with the measured box model
//! and the position assigned by the parent's algorithm.

use std::collections::HashMap;
use std::rc::Rc;

use arbor_css::{AlignItems, ComputedStyle, Display};
use arbor_dom::NodeId;

use crate::{BoxDimensions, Geometry, Point, Size};

/// Layout box identifier (index into the arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayoutBoxId(pub usize);

/// Leaf content that measures itself
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(String),
    /// Icon or item sprite with the configured intrinsic size
    Sprite,
    /// Fixed size taken from the element's attributes
    Explicit(Size),
}

/// How a box sizes and places what it contains
#[derive(Debug, Clone, PartialEq)]
pub enum BoxKind {
    Flow,
    Flex,
    Content(Content),
}

/// A group of children placed side by side on the inline (flow) or main
/// (flex) axis
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Line {
    pub items: Vec<LayoutBoxId>,
    /// Extent along the line, margins and gaps included
    pub main: f32,
    /// Extent across the line
    pub cross: f32,
}

#[derive(Debug, Clone)]
pub struct LayoutBox {
    pub node: NodeId,
    pub kind: BoxKind,
    pub style: Rc<ComputedStyle>,
    pub parent: Option<LayoutBoxId>,
    pub children: Vec<LayoutBoxId>,
    pub dimensions: BoxDimensions,
    /// Outer box origin relative to the parent's content box
    pub position: Point,
    pub(crate) lines: Vec<Line>,
    /// Resolved column (width) and row (height) gaps of a flex container
    pub(crate) gaps: Size,
}

impl LayoutBox {
    pub fn is_text(&self) -> bool {
        matches!(self.kind, BoxKind::Content(Content::Text(_)))
    }

    /// Display used for placement. Text always flows inline.
    pub fn display(&self) -> Display {
        if self.is_text() { Display::Inline } else { self.style.display }
    }

    pub fn is_block_level(&self) -> bool {
        self.display().is_block_level()
    }

    pub fn geometry(&self) -> Geometry {
        Geometry { position: self.position, size: self.dimensions.outer_size() }
    }

    /// `(flex-grow, flex-shrink)`; text never grows
    pub fn flex_factors(&self) -> (f32, f32) {
        if self.is_text() {
            (0.0, 1.0)
        } else {
            (self.style.flex_grow, self.style.flex_shrink)
        }
    }

    pub fn order(&self) -> i32 {
        if self.is_text() { 0 } else { self.style.order }
    }

    /// Cross-axis alignment inside a container with `align-items: parent`
    pub fn alignment(&self, parent: AlignItems) -> AlignItems {
        if self.is_text() {
            parent
        } else {
            self.style.align_self.resolve(parent)
        }
    }
}

/// Layout tree - arena of positioned boxes
#[derive(Debug, Default)]
pub struct LayoutTree {
    boxes: Vec<LayoutBox>,
    root: Option<LayoutBoxId>,
    by_node: HashMap<NodeId, LayoutBoxId>,
}

impl LayoutTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached box for `node`
    pub fn create_box(&mut self, node: NodeId, kind: BoxKind, style: Rc<ComputedStyle>) -> LayoutBoxId {
        let id = LayoutBoxId(self.boxes.len());
        self.boxes.push(LayoutBox {
            node,
            kind,
            style,
            parent: None,
            children: Vec::new(),
            dimensions: BoxDimensions::default(),
            position: Point::ZERO,
            lines: Vec::new(),
            gaps: Size::ZERO,
        });
        self.by_node.insert(node, id);
        id
    }

    pub fn append_child(&mut self, parent: LayoutBoxId, child: LayoutBoxId) {
        if let Some(c) = self.boxes.get_mut(child.0) {
            c.parent = Some(parent);
        }
        if let Some(p) = self.boxes.get_mut(parent.0) {
            p.children.push(child);
        }
    }

    pub fn set_root(&mut self, id: LayoutBoxId) {
        self.root = Some(id);
    }

    pub fn root(&self) -> Option<LayoutBoxId> {
        self.root
    }

    pub fn get(&self, id: LayoutBoxId) -> Option<&LayoutBox> {
        self.boxes.get(id.0)
    }

    pub fn get_mut(&mut self, id: LayoutBoxId) -> Option<&mut LayoutBox> {
        self.boxes.get_mut(id.0)
    }

    pub fn children(&self, id: LayoutBoxId) -> &[LayoutBoxId] {
        self.get(id).map_or(&[], |b| b.children.as_slice())
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Boxes in DOM pre-order
    pub fn iter(&self) -> impl Iterator<Item = (LayoutBoxId, &LayoutBox)> {
        self.boxes.iter().enumerate().map(|(i, b)| (LayoutBoxId(i), b))
    }

    /// Box generated for a DOM node, if it is displayed
    pub fn box_for(&self, node: NodeId) -> Option<LayoutBoxId> {
        self.by_node.get(&node).copied()
    }

    pub fn geometry(&self, node: NodeId) -> Option<Geometry> {
        self.get(self.box_for(node)?).map(LayoutBox::geometry)
    }

    /// Outer box origin in screen coordinates
    pub fn absolute_position(&self, node: NodeId) -> Option<Point> {
        let mut current = self.get(self.box_for(node)?)?;
        let mut position = current.position;
        while let Some(parent) = current.parent.and_then(|p| self.get(p)) {
            position = position + parent.dimensions.content_offset() + parent.position;
            current = parent;
        }
        Some(position)
    }

    /// Deepest node whose outer box contains `point` (screen coordinates).
    /// Later siblings are on top.
    pub fn hit_test(&self, point: Point) -> Option<NodeId> {
        self.hit_box(self.root?, Point::ZERO, point)
    }

    fn hit_box(&self, id: LayoutBoxId, origin: Point, point: Point) -> Option<NodeId> {
        let layout_box = self.get(id)?;
        let geometry = Geometry {
            position: origin + layout_box.position,
            size: layout_box.dimensions.outer_size(),
        };
        if !geometry.contains(point) {
            return None;
        }

        let content_origin = geometry.position + layout_box.dimensions.content_offset();
        layout_box
            .children
            .iter()
            .rev()
            .find_map(|child| self.hit_box(*child, content_origin, point))
            .or(Some(layout_box.node))
    }
}
