//! Arbor DOM - Document Object Model
//!
//! Arena-backed element tree. Nodes live in a single `Vec` owned by the
//! [`DomTree`] and refer to each other through [`NodeId`] indices, so the
//! parent link is a lookup and never an owning pointer.
//!
//! Every mutation is synchronous: it updates the tree, records the style
//! invalidation it causes and fires the matching mutation event before
//! returning.

mod attributes;
pub mod event;
mod invalidation;
mod listeners;
mod node;
mod operations;
mod tree;

pub use attributes::Attributes;
pub use event::{
    event_types, AttributeAction, AttributeMutation, Event, EventPayload, EventPhase,
    MouseButton, MouseEvent, ScrollDirection,
};
pub use invalidation::Invalidation;
pub use listeners::{ListenerError, ListenerFn, ListenerId};
pub use node::{ElementData, Node, NodeData, NodeState, TextData};
pub use operations::{DomError, DomResult};
pub use tree::DomTree;

/// Node identifier (index into the arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The document node always occupies the first slot
    pub const DOCUMENT: NodeId = NodeId(0);

    /// Arena index of this node
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
