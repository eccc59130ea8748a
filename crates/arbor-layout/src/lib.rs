//! Arbor Layout Engine
//!
//! Turns a styled DOM tree into a tree of sized and positioned boxes.
//! It implements:
//! - the box model (margin, outline, border, padding, content)
//! - flow layout (block stacking, inline lines with wrapping)
//! - flexbox layout
//!
//! Layout happens in two passes. Measure fixes every box's size
//! bottom-up, arrange then positions each box inside its parent's
//! content box top-down.

mod box_model;
mod config;
mod flex;
mod flow;
mod layout_tree;
mod metrics;
mod reflow;
mod units;

pub use box_model::{guard, BoxDimensions, EdgeSizes, Geometry, Point, Size};
pub use config::LayoutConfig;
pub use layout_tree::{BoxKind, Content, LayoutBox, LayoutBoxId, LayoutTree};
pub use metrics::{HeuristicMetrics, TextMetrics};
pub use units::{Axis, UnitResolver};

use arbor_css::{StyleError, StyleResolver};
use arbor_dom::{DomTree, NodeId};
use thiserror::Error;

use reflow::{Forced, Reflow};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error(transparent)]
    Style(#[from] StyleError),
}

/// Lay out the subtree rooted at `root` and return the box tree.
///
/// `root` is placed at the screen origin, offset by its own margins. A
/// root with `display: none` produces an empty tree.
pub fn layout(
    dom: &DomTree,
    root: NodeId,
    styles: &mut StyleResolver,
    metrics: &dyn TextMetrics,
    config: &LayoutConfig,
) -> Result<LayoutTree, LayoutError> {
    if dom.get(root).is_none() {
        return Err(LayoutError::UnknownNode(root));
    }

    let mut tree = LayoutTree::new();
    let Some(root_box) = build_layout_tree(&mut tree, dom, styles, root)? else {
        return Ok(tree);
    };
    tree.set_root(root_box);

    let mut reflow = Reflow::new(&mut tree, metrics, config);
    reflow.measure(root_box, Forced::default());
    reflow.arrange(root_box);

    if let Some(b) = tree.get_mut(root_box) {
        b.position = Point::new(b.dimensions.margin.left, b.dimensions.margin.top);
    }

    tracing::info!(boxes = tree.len(), "layout complete");
    Ok(tree)
}

/// Build boxes for `node` and its displayed descendants
fn build_layout_tree(
    tree: &mut LayoutTree,
    dom: &DomTree,
    styles: &mut StyleResolver,
    node: NodeId,
) -> Result<Option<LayoutBoxId>, LayoutError> {
    if let Some(text) = dom.text(node) {
        if text.content().trim().is_empty() {
            return Ok(None);
        }
        let style = styles.computed_style(dom, node)?;
        let kind = BoxKind::Content(Content::Text(text.content().to_string()));
        return Ok(Some(tree.create_box(node, kind, style)));
    }

    let style = styles.computed_style(dom, node)?;
    if !style.is_displayed() {
        return Ok(None);
    }

    let kind = match dom.tag_name(node) {
        Some("icon" | "item") => BoxKind::Content(Content::Sprite),
        Some("canvas") => {
            let attr = |key| dom.get_attribute(node, key).and_then(|v| v.trim().parse::<f32>().ok());
            let size = Size::new(attr("width").unwrap_or(0.0), attr("height").unwrap_or(0.0));
            BoxKind::Content(Content::Explicit(size.guarded()))
        }
        _ if style.display == arbor_css::Display::Flex => BoxKind::Flex,
        _ => BoxKind::Flow,
    };
    let leaf = matches!(kind, BoxKind::Content(_));
    let id = tree.create_box(node, kind, style);

    if !leaf {
        for &child in dom.children(node) {
            if let Some(child_box) = build_layout_tree(tree, dom, styles, child)? {
                tree.append_child(id, child_box);
            }
        }
    }
    Ok(Some(id))
}
