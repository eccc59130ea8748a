//! Document - a styled, laid out element tree
//!
//! [`Document`] owns everything one open view needs: the DOM, the style
//! resolver with its stylesheets, the last layout and the configuration.
//! Reads sync pending invalidations first, so computed styles and
//! geometry always reflect the latest mutations.

use std::rc::Rc;

use arbor_css::{
    ComputedStyle, Diagnostic, SelectorError, SelectorGroup, StyleError, StyleResolver, Stylesheet, StylesheetId,
};
use arbor_dom::{DomError, DomTree, Event, ListenerError, ListenerId, MouseEvent, NodeId, NodeState};
use arbor_layout::{Geometry, HeuristicMetrics, LayoutConfig, LayoutError, LayoutTree, Point, TextMetrics};

use crate::default_style::default_stylesheet;
use crate::Config;

/// Engine error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("Style error: {0}")]
    Style(#[from] StyleError),

    #[error("Selector error: {0}")]
    Selector(#[from] SelectorError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),
}

pub type EngineResult<T> = Result<T, EngineError>;

pub struct Document {
    tree: DomTree,
    styles: StyleResolver,
    layout: Option<LayoutTree>,
    config: Config,
    layout_config: LayoutConfig,
    metrics: Box<dyn TextMetrics>,
}

impl Document {
    /// Create a document measuring text with [`HeuristicMetrics`]
    pub fn new(config: Config) -> Self {
        let metrics = HeuristicMetrics::new(&LayoutConfig::from(&config));
        Self::with_metrics(config, metrics)
    }

    /// Create a document with a custom text measure
    pub fn with_metrics(config: Config, metrics: impl TextMetrics + 'static) -> Self {
        let mut styles = StyleResolver::new();
        if config.default_stylesheet {
            let sheet = default_stylesheet(styles.parser());
            styles.add_stylesheet(sheet);
        }

        Self {
            tree: DomTree::new(),
            styles,
            layout: None,
            layout_config: LayoutConfig::from(&config),
            config,
            metrics: Box::new(metrics),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Direct tree access. Mutations made here are picked up on the next
    /// style or layout read.
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    // ------------------------------------------------------------------
    // Tree construction and mutation
    // ------------------------------------------------------------------

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.tree.create_element(tag)
    }

    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.tree.create_text(content)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> EngineResult<()> {
        Ok(self.tree.append_child(parent, child)?)
    }

    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> EngineResult<()> {
        Ok(self.tree.insert_before(parent, child, reference)?)
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> EngineResult<()> {
        Ok(self.tree.remove_child(parent, child)?)
    }

    pub fn destroy(&mut self, node: NodeId) -> EngineResult<()> {
        Ok(self.tree.destroy(node)?)
    }

    pub fn set_attribute(&mut self, node: NodeId, key: &str, value: Option<&str>) -> EngineResult<()> {
        Ok(self.tree.set_attribute(node, key, value)?)
    }

    pub fn remove_attribute(&mut self, node: NodeId, key: &str) -> EngineResult<()> {
        Ok(self.tree.remove_attribute(node, key)?)
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) -> EngineResult<()> {
        Ok(self.tree.add_class(node, class)?)
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) -> EngineResult<()> {
        Ok(self.tree.remove_class(node, class)?)
    }

    pub fn toggle_class(&mut self, node: NodeId, class: &str) -> EngineResult<bool> {
        Ok(self.tree.toggle_class(node, class)?)
    }

    pub fn set_text(&mut self, node: NodeId, content: &str) -> EngineResult<()> {
        Ok(self.tree.set_text(node, content)?)
    }

    pub fn set_option(&mut self, key: &str, value: Option<&str>) -> EngineResult<()> {
        Ok(self.tree.set_option(key, value)?)
    }

    pub fn set_state(&mut self, node: NodeId, state: NodeState) -> EngineResult<()> {
        Ok(self.tree.set_state(node, state)?)
    }

    // ------------------------------------------------------------------
    // Stylesheets and computed styles
    // ------------------------------------------------------------------

    /// Compile `source` and attach it. The diagnostics are also kept on
    /// the stored stylesheet.
    pub fn add_stylesheet(&mut self, source: &str) -> (StylesheetId, Vec<Diagnostic>) {
        let sheet = self.styles.parser().parse(source);
        let diagnostics = sheet.diagnostics.clone();
        for diagnostic in &diagnostics {
            tracing::warn!(%diagnostic, "stylesheet diagnostic");
        }
        let id = self.styles.add_stylesheet(sheet);
        self.layout = None;
        (id, diagnostics)
    }

    /// Attach an already compiled stylesheet
    pub fn attach_stylesheet(&mut self, sheet: Stylesheet) -> StylesheetId {
        self.layout = None;
        self.styles.add_stylesheet(sheet)
    }

    pub fn remove_stylesheet(&mut self, id: StylesheetId) -> EngineResult<Stylesheet> {
        let sheet = self.styles.remove_stylesheet(id)?;
        self.layout = None;
        Ok(sheet)
    }

    pub fn stylesheets(&self) -> impl Iterator<Item = (StylesheetId, &Stylesheet)> {
        self.styles.stylesheets()
    }

    pub fn computed_style(&mut self, node: NodeId) -> EngineResult<Rc<ComputedStyle>> {
        self.sync();
        Ok(self.styles.computed_style(&self.tree, node)?)
    }

    /// Drop cached styles and layout covered by pending invalidations
    fn sync(&mut self) {
        if self.tree.has_pending_invalidations() {
            self.layout = None;
        }
        self.styles.sync(&mut self.tree);
    }

    // ------------------------------------------------------------------
    // Layout
    // ------------------------------------------------------------------

    /// Lay out the document if anything changed since the last layout
    pub fn layout(&mut self) -> EngineResult<&LayoutTree> {
        self.sync();
        let tree = match self.layout.take() {
            Some(tree) => tree,
            None => arbor_layout::layout(
                &self.tree,
                self.tree.root(),
                &mut self.styles,
                self.metrics.as_ref(),
                &self.layout_config,
            )?,
        };
        Ok(self.layout.insert(tree))
    }

    /// Whether the next [`Document::layout`] call will recompute
    pub fn needs_layout(&self) -> bool {
        self.layout.is_none() || self.tree.has_pending_invalidations()
    }

    /// Size and position of `node` relative to its parent's content box.
    /// `None` when the node is not displayed.
    pub fn geometry(&mut self, node: NodeId) -> EngineResult<Option<Geometry>> {
        Ok(self.layout()?.geometry(node))
    }

    pub fn absolute_position(&mut self, node: NodeId) -> EngineResult<Option<Point>> {
        Ok(self.layout()?.absolute_position(node))
    }

    /// Deepest element under a screen position
    pub fn element_at(&mut self, point: Point) -> EngineResult<Option<NodeId>> {
        let hit = self.layout()?.hit_test(point);
        Ok(hit.map(|node| {
            if self.tree.is_text(node) {
                self.tree.parent(node).unwrap_or(node)
            } else {
                node
            }
        }))
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Elements under the root matching `selector`, in document order
    pub fn query_selector_all(&self, selector: &str) -> EngineResult<Vec<NodeId>> {
        let group = SelectorGroup::parse(selector)?;
        Ok(group.select_all(&self.tree, self.tree.root()))
    }

    pub fn query_selector(&self, selector: &str) -> EngineResult<Option<NodeId>> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn add_event_listener<F>(&mut self, target: NodeId, event_type: &str, listener: F) -> EngineResult<ListenerId>
    where
        F: Fn(&mut Event, &mut DomTree) -> Result<(), ListenerError> + 'static,
    {
        Ok(self.tree.add_event_listener(target, event_type, listener)?)
    }

    pub fn remove_event_listener(&mut self, target: NodeId, event_type: &str, id: ListenerId) -> bool {
        self.tree.remove_event_listener(target, event_type, id)
    }

    pub fn dispatch_event(&mut self, target: NodeId, event: Event) -> EngineResult<Event> {
        Ok(self.tree.dispatch_event(target, event)?)
    }

    /// Dispatch a pointer event at the element under its screen position,
    /// or at the root when nothing is hit
    pub fn dispatch_mouse(&mut self, event_type: &str, data: MouseEvent) -> EngineResult<Event> {
        let (x, y) = data.screen_position;
        let target = self.element_at(Point::new(x, y))?.unwrap_or(self.tree.root());
        self.dispatch_event(target, Event::mouse(event_type, data))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.tree.len())
            .field("stylesheets", &self.styles.stylesheets().count())
            .field("laid_out", &self.layout.is_some())
            .finish()
    }
}
