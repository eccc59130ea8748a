//! DOM Node
//!
//! A node is a tagged variant over document, element and text payloads
//! with a shared tree facet (parent link, ordered children, sibling index
//! and depth).

use crate::{Attributes, NodeId};

/// DOM Node - tree facet plus kind specific payload
#[derive(Debug)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) sibling_index: Option<usize>,
    pub(crate) depth: usize,
    pub(crate) released: bool,
    pub data: NodeData,
}

impl Node {
    pub(crate) fn new(data: NodeData) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            sibling_index: None,
            depth: 0,
            released: false,
            data,
        }
    }

    /// Parent node, `None` when detached or for the root element
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in sibling order
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Position among the parent's children, `None` when detached
    #[inline]
    pub fn sibling_index(&self) -> Option<usize> {
        self.sibling_index
    }

    /// Distance from the topmost ancestor; 0 for the root and for detached nodes
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_text(&self) -> Option<&TextData> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Node payload
#[derive(Debug)]
pub enum NodeData {
    /// The document node; also the global event target
    Document,
    Element(ElementData),
    Text(TextData),
}

/// Element payload
#[derive(Debug)]
pub struct ElementData {
    tag: String,
    pub(crate) attributes: Attributes,
    pub(crate) state: NodeState,
}

impl ElementData {
    pub(crate) fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: Attributes::new(),
            state: NodeState::default(),
        }
    }

    /// Tag name, fixed at creation
    #[inline]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[inline]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    #[inline]
    pub fn state(&self) -> NodeState {
        self.state
    }
}

/// Text payload
#[derive(Debug)]
pub struct TextData {
    pub(crate) content: String,
}

impl TextData {
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Interaction state driven by external input, visible to `:hover`,
/// `:active` and `:focus`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeState {
    pub hovered: bool,
    pub active: bool,
    pub focused: bool,
}
