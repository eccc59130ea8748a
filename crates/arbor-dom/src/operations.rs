//! DOM Node Operations
//!
//! Mutation primitives: create, append, insert, remove, attributes, text,
//! options and interaction state. Each one records the style invalidation
//! it causes and fires its mutation event synchronously.

use crate::event::{event_types, AttributeAction, AttributeMutation, Event};
use crate::{ElementData, Invalidation, Node, NodeData, NodeId, NodeState, TextData, DomTree};

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM precondition violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),
    #[error("node {0} is not a text node")]
    NotAText(NodeId),
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("inserting {child} under {parent} would create a cycle")]
    HierarchyRequest { parent: NodeId, child: NodeId },
    #[error("the root element cannot be moved or released")]
    RootImmovable,
    #[error("node {0} is still attached")]
    StillAttached(NodeId),
    #[error("attribute and option keys must not be empty")]
    EmptyKey,
    #[error("event type must not be empty")]
    EmptyEventType,
    #[error("event '{0}' was dispatched before being initialized")]
    EventNotInitialized(String),
}

impl DomTree {
    /// Create a new, detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(Node::new(NodeData::Element(ElementData::new(tag))))
    }

    /// Create a new, detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.alloc(Node::new(NodeData::Text(TextData { content: content.to_string() })))
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// An attached child is first removed from its current parent, which
    /// fires `remove-child` there.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference`, or at the end when `reference` is `None`
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        self.check_insertable(parent, child)?;
        if let Some(r) = reference {
            if r == child {
                return Ok(());
            }
            self.check_child(parent, r)?;
        }

        if let Some(old_parent) = self.node(child)?.parent {
            self.remove_child(old_parent, child)?;
            // A listener may have re-attached it
            if self.node(child)?.parent.is_some() {
                self.unlink(child);
            }
        }

        let index = match reference {
            Some(r) => {
                self.check_child(parent, r)?;
                self.node(r)?.sibling_index.unwrap_or(0)
            }
            None => self.node(parent)?.children.len(),
        };

        let depth = self.node(parent)?.depth + 1;
        self.node_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        self.reindex_children(parent, index);
        self.set_subtree_depth(child, depth);

        self.invalidations.push(Invalidation::Subtree(parent));
        self.fire(parent, Event::mutation(event_types::APPEND_CHILD, child));
        Ok(())
    }

    /// Remove `child` from `parent`.
    ///
    /// `remove-child` fires on `parent` while the child is still attached.
    /// Afterwards the child reports no sibling index and depth 0.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.check_child(parent, child)?;
        self.fire(parent, Event::mutation(event_types::REMOVE_CHILD, child));

        if self.node(child)?.parent == Some(parent) {
            self.unlink(child);
            self.invalidations.push(Invalidation::Subtree(parent));
            self.invalidations.push(Invalidation::Subtree(child));
        }
        Ok(())
    }

    /// Release a detached subtree. Its slots become invisible and every
    /// listener registered on it is dropped.
    pub fn destroy(&mut self, node: NodeId) -> DomResult<()> {
        if node == self.root || node == NodeId::DOCUMENT {
            return Err(DomError::RootImmovable);
        }
        if self.node(node)?.parent.is_some() {
            return Err(DomError::StillAttached(node));
        }

        let mut doomed = self.descendants(node);
        doomed.push(node);
        self.invalidations.push(Invalidation::Subtree(node));
        for id in doomed {
            self.listeners.remove_node(id);
            if let Some(n) = self.nodes.get_mut(id.index()) {
                n.released = true;
                n.children.clear();
            }
        }
        Ok(())
    }

    /// Set (`Some`) or remove (`None`) an attribute.
    ///
    /// Fires `modify-attribute` with action ADD, SET or REMOVE. Setting the
    /// current value again is a no-op.
    pub fn set_attribute(&mut self, id: NodeId, key: &str, value: Option<&str>) -> DomResult<()> {
        if key.is_empty() {
            return Err(DomError::EmptyKey);
        }
        let element = self
            .node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(id))?;

        let previous = element.attributes.get(key).map(str::to_string);
        if previous.as_deref() == value {
            return Ok(());
        }

        let action = match (&previous, value) {
            (_, None) => AttributeAction::Remove,
            (None, Some(_)) => AttributeAction::Add,
            (Some(_), Some(_)) => AttributeAction::Set,
        };
        match value {
            Some(v) => {
                element.attributes.set(key, v);
            }
            None => {
                element.attributes.remove(key);
            }
        }

        self.invalidate_matching(id);
        let mutation = AttributeMutation {
            key: key.to_string(),
            previous,
            value: value.map(str::to_string),
            action,
        };
        self.fire(id, Event::attribute_mutate(event_types::MODIFY_ATTR, mutation));
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, key: &str) -> DomResult<()> {
        self.set_attribute(id, key, None)
    }

    /// Add a word to the `class` attribute
    pub fn add_class(&mut self, id: NodeId, class: &str) -> DomResult<()> {
        if self.element_checked(id)?.attributes.has_class(class) {
            return Ok(());
        }
        let mut classes: Vec<String> = self.class_list(id).into_iter().map(String::from).collect();
        classes.push(class.to_string());
        self.set_attribute(id, "class", Some(&classes.join(" ")))
    }

    /// Remove a word from the `class` attribute
    pub fn remove_class(&mut self, id: NodeId, class: &str) -> DomResult<()> {
        if !self.element_checked(id)?.attributes.has_class(class) {
            return Ok(());
        }
        let remaining: Vec<String> = self
            .class_list(id)
            .into_iter()
            .filter(|c| *c != class)
            .map(String::from)
            .collect();
        if remaining.is_empty() {
            self.set_attribute(id, "class", None)
        } else {
            self.set_attribute(id, "class", Some(&remaining.join(" ")))
        }
    }

    /// Flip a class word, returning whether it is now present
    pub fn toggle_class(&mut self, id: NodeId, class: &str) -> DomResult<bool> {
        if self.element_checked(id)?.attributes.has_class(class) {
            self.remove_class(id, class)?;
            Ok(false)
        } else {
            self.add_class(id, class)?;
            Ok(true)
        }
    }

    /// Replace the content of a text node. `text-change` fires on the
    /// parent element, naming the text node.
    pub fn set_text(&mut self, id: NodeId, content: &str) -> DomResult<()> {
        let node = self.node_mut(id)?;
        let parent = node.parent;
        match &mut node.data {
            NodeData::Text(text) => {
                if text.content == content {
                    return Ok(());
                }
                text.content = content.to_string();
            }
            _ => return Err(DomError::NotAText(id)),
        }

        if let Some(parent) = parent {
            self.invalidations.push(Invalidation::Element(parent));
            self.fire(parent, Event::text_change(id));
        }
        Ok(())
    }

    /// Set or clear a document option. `modify-option` fires on the
    /// document node.
    pub fn set_option(&mut self, key: &str, value: Option<&str>) -> DomResult<()> {
        if key.is_empty() {
            return Err(DomError::EmptyKey);
        }
        let previous = self.options.get(key).cloned();
        if previous.as_deref() == value {
            return Ok(());
        }

        let action = match (&previous, value) {
            (_, None) => AttributeAction::Remove,
            (None, Some(_)) => AttributeAction::Add,
            (Some(_), Some(_)) => AttributeAction::Set,
        };
        match value {
            Some(v) => {
                self.options.insert(key.to_string(), v.to_string());
            }
            None => {
                self.options.remove(key);
            }
        }

        let mutation = AttributeMutation {
            key: key.to_string(),
            previous,
            value: value.map(str::to_string),
            action,
        };
        let mut event = Event::attribute_mutate(event_types::MODIFY_OPTION, mutation);
        event.init(false, false);
        self.fire(NodeId::DOCUMENT, event);
        Ok(())
    }

    /// Update hover/active/focus state
    pub fn set_state(&mut self, id: NodeId, state: NodeState) -> DomResult<()> {
        let element = self
            .node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(id))?;
        if element.state != state {
            element.state = state;
            self.invalidate_matching(id);
        }
        Ok(())
    }

    // ---- Internals ----

    fn element_checked(&self, id: NodeId) -> DomResult<&ElementData> {
        self.node(id)?.as_element().ok_or(DomError::NotAnElement(id))
    }

    fn check_child(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.node(parent)?;
        if self.node(child)?.parent != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        Ok(())
    }

    fn check_insertable(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if !self.node(parent)?.is_element() {
            return Err(DomError::NotAnElement(parent));
        }
        let node = self.node(child)?;
        if matches!(node.data, NodeData::Document) || child == self.root {
            return Err(DomError::RootImmovable);
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        Ok(())
    }

    /// Detach without firing events
    fn unlink(&mut self, child: NodeId) {
        let Some(node) = self.get_mut(child) else { return };
        let (Some(parent), Some(index)) = (node.parent.take(), node.sibling_index.take()) else {
            return;
        };
        if let Some(p) = self.get_mut(parent) {
            if index < p.children.len() && p.children[index] == child {
                p.children.remove(index);
            } else {
                p.children.retain(|c| *c != child);
            }
        }
        self.reindex_children(parent, index);
        self.set_subtree_depth(child, 0);
    }

    fn reindex_children(&mut self, parent: NodeId, from: usize) {
        let children = self.children(parent).to_vec();
        for (i, c) in children.into_iter().enumerate().skip(from) {
            if let Some(n) = self.get_mut(c) {
                n.sibling_index = Some(i);
            }
        }
    }

    fn set_subtree_depth(&mut self, id: NodeId, depth: usize) {
        let mut stack = vec![(id, depth)];
        while let Some((node, d)) = stack.pop() {
            if let Some(n) = self.get_mut(node) {
                n.depth = d;
                stack.extend(n.children.iter().map(|c| (*c, d + 1)));
            }
        }
    }

    /// Attribute and state changes can flip matches on the element, its
    /// descendants and every sibling: `+`/`~` look backwards, while
    /// `:nth-last-*` and `of S` filters count the siblings after it.
    fn invalidate_matching(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            self.invalidations.push(Invalidation::Subtree(id));
            return;
        };
        let siblings: Vec<NodeId> = self
            .children(parent)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
            .collect();
        self.invalidations.extend(siblings.into_iter().map(Invalidation::Subtree));
    }

    /// Dispatch a built-in mutation event, logging instead of failing
    fn fire(&mut self, target: NodeId, event: Event) {
        if self.listeners.is_empty() {
            return;
        }
        if let Err(error) = self.dispatch_event(target, event) {
            tracing::debug!(%error, "mutation event not dispatched");
        }
    }
}
