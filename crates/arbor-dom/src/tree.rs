//! DOM Tree (arena-based allocation)

use std::collections::HashMap;

use crate::listeners::ListenerRegistry;
use crate::{
    DomError, DomResult, ElementData, Invalidation, Node, NodeData, NodeId, NodeState, TextData,
};

/// Tag given to the root element by [`DomTree::new`]
pub const DEFAULT_ROOT_TAG: &str = "root";

/// Arena-based DOM tree.
///
/// Slot 0 is the document node, which owns the root element, the option
/// map and the global listener registry. Released nodes keep their slot
/// but are invisible to every lookup.
pub struct DomTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) options: HashMap<String, String>,
    pub(crate) listeners: ListenerRegistry,
    pub(crate) invalidations: Vec<Invalidation>,
}

impl DomTree {
    /// Create a document with a `root` element
    pub fn new() -> Self {
        Self::with_root_tag(DEFAULT_ROOT_TAG)
    }

    /// Create a document whose root element has the given tag
    pub fn with_root_tag(tag: &str) -> Self {
        let mut root = Node::new(NodeData::Element(ElementData::new(tag)));
        root.sibling_index = Some(0);

        Self {
            nodes: vec![Node::new(NodeData::Document), root],
            root: NodeId(1),
            options: HashMap::new(),
            listeners: ListenerRegistry::default(),
            invalidations: Vec::new(),
        }
    }

    /// The document node (global event target)
    #[inline]
    pub fn document(&self) -> NodeId {
        NodeId::DOCUMENT
    }

    /// The root element
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).filter(|n| !n.released)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index()).filter(|n| !n.released)
    }

    pub(crate) fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::UnknownNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.get_mut(id).ok_or(DomError::UnknownNode(id))
    }

    /// Number of live nodes, the document node included
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| !n.released).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ---- Structure ----

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(Node::children).unwrap_or(&[])
    }

    /// Element children in sibling order
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).iter().copied().filter(move |c| self.is_element(*c))
    }

    pub fn sibling_index(&self, id: NodeId) -> Option<usize> {
        self.get(id).and_then(Node::sibling_index)
    }

    pub fn depth(&self, id: NodeId) -> usize {
        self.get(id).map(Node::depth).unwrap_or(0)
    }

    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.sibling_index(id)?;
        self.children(parent)[..index]
            .iter()
            .rev()
            .copied()
            .find(|s| self.is_element(*s))
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.sibling_index(id)?;
        self.children(parent)[index + 1..]
            .iter()
            .copied()
            .find(|s| self.is_element(*s))
    }

    /// Ancestors from the immediate parent up to the topmost node
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors { tree: self, next: self.parent(id) }
    }

    /// Descendants in pre-order, `id` itself excluded
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Whether the node hangs off the root element
    pub fn is_connected(&self, id: NodeId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        id == self.root || self.ancestors(id).any(|a| a == self.root)
    }

    /// `true` for `a == b` or when `a` is above `b`
    pub fn is_inclusive_ancestor(&self, a: NodeId, b: NodeId) -> bool {
        a == b || self.ancestors(b).any(|x| x == a)
    }

    // ---- Payload access ----

    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_element)
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_text)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::as_element)
    }

    pub fn text(&self, id: NodeId) -> Option<&TextData> {
        self.get(id).and_then(Node::as_text)
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(ElementData::tag)
    }

    pub fn get_attribute(&self, id: NodeId, key: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attributes.get(key))
    }

    pub fn has_attribute(&self, id: NodeId, key: &str) -> bool {
        self.element(id).is_some_and(|e| e.attributes.contains(key))
    }

    pub fn id_attr(&self, id: NodeId) -> Option<&str> {
        self.element(id).and_then(|e| e.attributes.id())
    }

    pub fn class_list(&self, id: NodeId) -> Vec<&str> {
        self.element(id)
            .map(|e| e.attributes.classes().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|e| e.attributes.has_class(class))
    }

    pub fn state(&self, id: NodeId) -> NodeState {
        self.element(id).map(ElementData::state).unwrap_or_default()
    }

    /// Concatenated content of every text node below (or at) `id`
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.content.clone();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|d| self.text(d))
            .map(TextData::content)
            .collect()
    }

    // ---- Options ----

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn options(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    // ---- Invalidation ----

    /// Drain pending style invalidations
    pub fn take_invalidations(&mut self) -> Vec<Invalidation> {
        std::mem::take(&mut self.invalidations)
    }

    pub fn has_pending_invalidations(&self) -> bool {
        !self.invalidations.is_empty()
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DomTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomTree")
            .field("nodes", &self.len())
            .field("root", &self.root)
            .field("options", &self.options)
            .finish()
    }
}

/// Iterator over the ancestors of a node
pub struct Ancestors<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tree_has_root() {
        let tree = DomTree::new();
        assert_eq!(tree.tag_name(tree.root()), Some("root"));
        assert_eq!(tree.depth(tree.root()), 0);
        assert_eq!(tree.sibling_index(tree.root()), Some(0));
        assert!(tree.is_connected(tree.root()));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_descendants_pre_order() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let a = tree.create_element("a");
        let b = tree.create_element("b");
        let c = tree.create_element("c");
        tree.append_child(root, a).unwrap();
        tree.append_child(a, b).unwrap();
        tree.append_child(root, c).unwrap();

        assert_eq!(tree.descendants(root), vec![a, b, c]);
        assert_eq!(tree.ancestors(b).collect::<Vec<_>>(), vec![a, root]);
    }

    #[test]
    fn test_element_siblings_skip_text() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let a = tree.create_element("a");
        let t = tree.create_text("hello");
        let b = tree.create_element("b");
        for n in [a, t, b] {
            tree.append_child(root, n).unwrap();
        }

        assert_eq!(tree.next_element_sibling(a), Some(b));
        assert_eq!(tree.previous_element_sibling(b), Some(a));
        assert_eq!(tree.previous_element_sibling(a), None);
        assert_eq!(tree.element_children(root).count(), 2);
        assert_eq!(tree.text_content(root), "hello");
    }
}
