//! Style invalidation records
//!
//! Mutations push these into the tree; the style resolver drains them
//! and drops the cached computed styles they cover.

use crate::NodeId;

/// A region of the tree whose computed styles may be stale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    /// Only this element
    Element(NodeId),
    /// This node and all of its descendants
    Subtree(NodeId),
}

impl Invalidation {
    pub fn node(&self) -> NodeId {
        match *self {
            Invalidation::Element(id) | Invalidation::Subtree(id) => id,
        }
    }
}
