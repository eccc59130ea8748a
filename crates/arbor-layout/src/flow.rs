//! Flow Layout
//!
//! Children are packed into lines. Block-level boxes sit alone on their
//! line; inline-level boxes share lines and wrap once the next one would
//! overflow the container's content width.

use arbor_css::{Display, VerticalAlign};

use crate::box_model::guard;
use crate::layout_tree::Line;
use crate::reflow::{Forced, Reflow};
use crate::{EdgeSizes, LayoutBox, LayoutBoxId, Point, Size};

/// Margins that take part in flow. Inline boxes ignore theirs.
fn flow_margin(layout_box: &LayoutBox) -> EdgeSizes {
    if layout_box.display() == Display::Inline {
        EdgeSizes::ZERO
    } else {
        layout_box.dimensions.margin
    }
}

impl Reflow<'_> {
    /// Measure the children of a flow container. Returns the content size
    /// they need.
    pub(crate) fn measure_flow(&mut self, id: LayoutBoxId, available: Size) -> Size {
        let children = self.tree.children(id).to_vec();
        let mut lines: Vec<Line> = Vec::new();
        let mut current = Line::default();

        for child in children {
            let outer = self.measure(child, Forced::default());
            let Some(b) = self.tree.get(child) else {
                continue;
            };
            let block = b.is_block_level();
            let margin = flow_margin(b);
            let width = outer.width + margin.horizontal();
            let height = outer.height + margin.vertical();

            let overflows = current.main + width > available.width;
            if !current.items.is_empty() && (block || overflows) {
                lines.push(std::mem::take(&mut current));
            }

            current.items.push(child);
            current.main += width;
            current.cross = current.cross.max(height);

            if block {
                lines.push(std::mem::take(&mut current));
            }
        }
        if !current.items.is_empty() {
            lines.push(current);
        }

        let size = Size::new(
            lines.iter().map(|l| l.main).fold(0.0, f32::max),
            lines.iter().map(|l| l.cross).sum(),
        );
        if let Some(b) = self.tree.get_mut(id) {
            b.lines = lines;
        }
        size
    }

    pub(crate) fn arrange_flow(&mut self, id: LayoutBoxId) {
        let Some(container) = self.tree.get(id) else {
            return;
        };
        let available = container.dimensions.content.width;
        let lines = container.lines.clone();

        let mut y = 0.0;
        for line in &lines {
            let mut x = match line.items.as_slice() {
                [only] => self.tree.get(*only).map_or(0.0, |b| {
                    let free = available - line.main;
                    match (b.dimensions.auto_margin.left, b.dimensions.auto_margin.right) {
                        (true, true) if b.is_block_level() => free / 2.0,
                        (true, false) if b.is_block_level() => free,
                        _ => 0.0,
                    }
                }),
                _ => 0.0,
            };

            for item in &line.items {
                let Some(b) = self.tree.get_mut(*item) else {
                    continue;
                };
                let margin = flow_margin(b);
                let outer = b.dimensions.outer_size();
                let free = line.cross - outer.height - margin.vertical();
                let offset = match b.style.vertical_align {
                    _ if b.is_text() => 0.0,
                    VerticalAlign::Top => 0.0,
                    VerticalAlign::Middle => free / 2.0,
                    VerticalAlign::Bottom => free,
                };

                b.position = Point::new(guard(x + margin.left), guard(y + offset + margin.top));
                x += outer.width + margin.horizontal();
            }
            y += line.cross;
        }
    }
}
