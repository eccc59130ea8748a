//! Measure and arrange passes
//!
//! Measure runs bottom-up and fixes every box's size. A container whose
//! width or height is `auto` is measured repeatedly: the first pass lets
//! children see the space the parent offers, later passes shrink the
//! container to what the children used, until two passes agree or the
//! configured pass bound is reached. Arrange then runs top-down and
//! positions children from the lines measure recorded.
//!
//! Flex items are measured several times per pass, so measure results are
//! memoized per box, imposed size and parent size. A hit restores only the
//! box's own dimensions; once the outermost measure returns, every box is
//! restored top-down to the result its parent last asked for.

use std::collections::HashMap;
use std::rc::Rc;

use arbor_css::{BoxSizing, ComputedStyle, Dimension};

use crate::box_model::guard;
use crate::units::{Axis, UnitResolver};
use crate::layout_tree::Line;
use crate::{BoxDimensions, BoxKind, Content, EdgeSizes, LayoutBoxId, LayoutConfig, LayoutTree, Size, TextMetrics};

/// Outer sizes imposed by the parent (flex sizing)
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Forced {
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl Forced {
    pub fn axes(main: Option<f32>, cross: Option<f32>, row: bool) -> Self {
        if row {
            Self { width: main, height: cross }
        } else {
            Self { width: cross, height: main }
        }
    }
}

/// Everything a measure result depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct MeasureKey {
    id: LayoutBoxId,
    width: Option<u32>,
    height: Option<u32>,
    parent: (u32, u32),
}

impl MeasureKey {
    fn new(id: LayoutBoxId, forced: Forced, parent: Size) -> Self {
        Self {
            id,
            width: forced.width.map(f32::to_bits),
            height: forced.height.map(f32::to_bits),
            parent: (parent.width.to_bits(), parent.height.to_bits()),
        }
    }
}

/// A box's own measure output, plus the last request made of each child
#[derive(Debug, Clone)]
struct Measured {
    outer: Size,
    dimensions: BoxDimensions,
    lines: Vec<Line>,
    gaps: Size,
    children: HashMap<LayoutBoxId, MeasureKey>,
}

#[derive(Debug, Clone, Copy)]
enum Sizing {
    Text(Size),
    Intrinsic(Size),
    Flow,
    Flex,
}

/// min/max constraints on the content box
#[derive(Debug, Clone, Copy)]
struct Limits {
    min: Size,
    max: Size,
}

impl Limits {
    fn clamp(&self, size: Size) -> Size {
        Size::new(
            size.width.min(self.max.width).max(self.min.width),
            size.height.min(self.max.height).max(self.min.height),
        )
    }
}

pub(crate) struct Reflow<'a> {
    pub(crate) tree: &'a mut LayoutTree,
    pub(crate) units: UnitResolver<'a>,
    metrics: &'a dyn TextMetrics,
    config: &'a LayoutConfig,
    measured: HashMap<MeasureKey, Measured>,
    /// Child requests of each measure in progress, innermost last
    requests: Vec<HashMap<LayoutBoxId, MeasureKey>>,
}

impl<'a> Reflow<'a> {
    pub fn new(tree: &'a mut LayoutTree, metrics: &'a dyn TextMetrics, config: &'a LayoutConfig) -> Self {
        Self {
            tree,
            units: UnitResolver::new(config),
            metrics,
            config,
            measured: HashMap::new(),
            requests: Vec::new(),
        }
    }

    /// Measure `id` and its subtree. Returns the outer size.
    pub fn measure(&mut self, id: LayoutBoxId, forced: Forced) -> Size {
        let key = MeasureKey::new(id, forced, self.units.parent_size());
        let outermost = match self.requests.last_mut() {
            Some(requests) => {
                requests.insert(id, key);
                false
            }
            None => true,
        };

        let outer = match self.measured.get(&key) {
            Some(hit) => {
                let outer = hit.outer;
                self.restore(key);
                outer
            }
            None => {
                self.requests.push(HashMap::new());
                let outer = self.measure_box(id, forced);
                let children = self.requests.pop().unwrap_or_default();
                if let Some(b) = self.tree.get(id) {
                    let measured = Measured {
                        outer,
                        dimensions: b.dimensions,
                        lines: b.lines.clone(),
                        gaps: b.gaps,
                        children,
                    };
                    self.measured.insert(key, measured);
                }
                outer
            }
        };

        if outermost {
            self.settle(key);
        }
        outer
    }

    /// Put back the box's own dimensions for a memoized result
    fn restore(&mut self, key: MeasureKey) {
        let Some(hit) = self.measured.get(&key) else {
            return;
        };
        if let Some(b) = self.tree.get_mut(key.id) {
            b.dimensions = hit.dimensions;
            b.lines.clone_from(&hit.lines);
            b.gaps = hit.gaps;
        }
    }

    /// Restore the subtree below `key` to the results arrange will read
    fn settle(&mut self, key: MeasureKey) {
        self.restore(key);
        let children: Vec<MeasureKey> = match self.measured.get(&key) {
            Some(m) => m.children.values().copied().collect(),
            None => return,
        };
        for child in children {
            self.settle(child);
        }
    }

    fn measure_box(&mut self, id: LayoutBoxId, forced: Forced) -> Size {
        let Some(layout_box) = self.tree.get(id) else {
            return Size::ZERO;
        };
        let style = Rc::clone(&layout_box.style);
        let sizing = match &layout_box.kind {
            BoxKind::Content(Content::Text(text)) => {
                let font_size = self.units.resolve(style.font_size, Axis::Horizontal);
                Sizing::Text(self.metrics.measure(text, font_size).guarded())
            }
            BoxKind::Content(Content::Sprite) => Sizing::Intrinsic(self.config.sprite_size),
            BoxKind::Content(Content::Explicit(size)) => Sizing::Intrinsic(*size),
            BoxKind::Flow => Sizing::Flow,
            BoxKind::Flex => Sizing::Flex,
        };

        // Text inherits its parent's style but none of its box
        if let Sizing::Text(size) = sizing {
            let content = Size::new(
                forced.width.unwrap_or(size.width),
                forced.height.unwrap_or(size.height),
            )
            .guarded();
            self.store(id, BoxDimensions { content, ..Default::default() });
            return content;
        }

        let mut dims = self.resolve_frame(&style);
        let frame = dims.frame();
        let border_box = style.box_sizing == BoxSizing::BorderBox;

        let width = match forced.width {
            Some(w) => Some(guard(w - frame.horizontal())),
            None => self.specified(style.width, Axis::Horizontal, frame.horizontal(), border_box),
        };
        let height = match forced.height {
            Some(h) => Some(guard(h - frame.vertical())),
            None => self.specified(style.height, Axis::Vertical, frame.vertical(), border_box),
        };
        let limits = self.limits(&style, frame, border_box);

        let content = match sizing {
            Sizing::Text(size) | Sizing::Intrinsic(size) => {
                limits.clamp(Size::new(width.unwrap_or(size.width), height.unwrap_or(size.height)))
            }
            Sizing::Flow | Sizing::Flex => {
                let parent = self.units.parent_size();
                let available = Size::new(
                    width.unwrap_or(parent.width - frame.horizontal() - dims.margin.horizontal()),
                    height.unwrap_or(parent.height - frame.vertical() - dims.margin.vertical()),
                )
                .guarded();
                let flex = matches!(sizing, Sizing::Flex);
                self.fit_children(id, flex, available, (width, height), limits)
            }
        };

        dims.content = content.guarded();
        let outer = dims.outer_size();
        self.store(id, dims);
        outer
    }

    /// Fixed point over the children's measure. `fixed` holds the content
    /// dimensions that are not `auto`.
    fn fit_children(
        &mut self,
        id: LayoutBoxId,
        flex: bool,
        available: Size,
        fixed: (Option<f32>, Option<f32>),
        limits: Limits,
    ) -> Size {
        let (width, height) = fixed;
        let definite = (width.is_some(), height.is_some());
        let mut content = limits.clamp(available);
        let mut passes = 0;

        loop {
            self.units.push(content);
            let needed = if flex {
                self.measure_flex(id, content, definite)
            } else {
                self.measure_flow(id, content)
            };
            self.units.pop();
            passes += 1;

            let next = limits.clamp(Size::new(
                width.unwrap_or(needed.width),
                height.unwrap_or(needed.height),
            ));
            if next.approx_eq(content) {
                return next;
            }
            content = next;

            if passes >= self.config.max_passes {
                let node = self.tree.get(id).map(|b| b.node);
                tracing::warn!(?node, passes, "measure did not settle, keeping last size");
                return content;
            }
        }
    }

    /// Position the children of `id`, then recurse
    pub fn arrange(&mut self, id: LayoutBoxId) {
        let Some(layout_box) = self.tree.get(id) else {
            return;
        };
        match layout_box.kind {
            BoxKind::Flow => self.arrange_flow(id),
            BoxKind::Flex => self.arrange_flex(id),
            BoxKind::Content(_) => return,
        }
        let children = self.tree.children(id).to_vec();
        for child in children {
            self.arrange(child);
        }
    }

    fn store(&mut self, id: LayoutBoxId, dims: BoxDimensions) {
        if let Some(b) = self.tree.get_mut(id) {
            b.dimensions = dims;
        }
    }

    fn resolve_frame(&self, style: &ComputedStyle) -> BoxDimensions {
        let units = &self.units;
        let edges = |e: &arbor_css::Edges<arbor_css::Primitive>| {
            EdgeSizes::new(
                units.resolve(e.top, Axis::Vertical),
                units.resolve(e.right, Axis::Horizontal),
                units.resolve(e.bottom, Axis::Vertical),
                units.resolve(e.left, Axis::Horizontal),
            )
            .guarded()
        };
        let margin = |d: Dimension, axis: Axis| units.resolve_dimension(d, axis).unwrap_or(0.0);

        BoxDimensions {
            content: Size::ZERO,
            padding: edges(&style.padding),
            border: edges(&style.border),
            outline: edges(&style.outline),
            margin: EdgeSizes::new(
                margin(style.margin.top, Axis::Vertical),
                margin(style.margin.right, Axis::Horizontal),
                margin(style.margin.bottom, Axis::Vertical),
                margin(style.margin.left, Axis::Horizontal),
            )
            .guarded(),
            auto_margin: style.margin.map(Dimension::is_auto),
        }
    }

    /// Content-box length of a specified dimension
    fn specified(&self, value: Dimension, axis: Axis, frame: f32, border_box: bool) -> Option<f32> {
        let v = self.units.resolve_dimension(value, axis)?;
        Some(if border_box { guard(v - frame) } else { guard(v) })
    }

    fn limits(&self, style: &ComputedStyle, frame: EdgeSizes, border_box: bool) -> Limits {
        let (h, v) = (frame.horizontal(), frame.vertical());
        Limits {
            min: Size::new(
                self.specified(style.min_width, Axis::Horizontal, h, border_box).unwrap_or(0.0),
                self.specified(style.min_height, Axis::Vertical, v, border_box).unwrap_or(0.0),
            ),
            max: Size::new(
                self.specified(style.max_width, Axis::Horizontal, h, border_box).unwrap_or(f32::INFINITY),
                self.specified(style.max_height, Axis::Vertical, v, border_box).unwrap_or(f32::INFINITY),
            ),
        }
    }
}
