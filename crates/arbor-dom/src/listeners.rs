//! Listener registries and dispatch

use std::collections::HashMap;
use std::rc::Rc;

use crate::event::{Event, EventPhase};
use crate::{DomError, DomResult, DomTree, NodeId};

/// Error returned by a failing listener; logged, never propagated
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Listener callback. Receives the event and the tree it is dispatched in.
pub type ListenerFn = dyn Fn(&mut Event, &mut DomTree) -> Result<(), ListenerError>;

/// Handle returned by registration, used for removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registered {
    id: ListenerId,
    callback: Rc<ListenerFn>,
}

/// Per (node, type) listener lists in registration order
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: u64,
    by_node: HashMap<NodeId, HashMap<String, Vec<Registered>>>,
}

impl ListenerRegistry {
    fn add(&mut self, node: NodeId, event_type: &str, callback: Rc<ListenerFn>) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.by_node
            .entry(node)
            .or_default()
            .entry(event_type.to_string())
            .or_default()
            .push(Registered { id, callback });
        id
    }

    fn remove(&mut self, node: NodeId, event_type: &str, id: ListenerId) -> bool {
        let Some(types) = self.by_node.get_mut(&node) else { return false };
        let Some(list) = types.get_mut(event_type) else { return false };

        let before = list.len();
        list.retain(|r| r.id != id);
        let removed = list.len() != before;

        if list.is_empty() {
            types.remove(event_type);
        }
        if types.is_empty() {
            self.by_node.remove(&node);
        }
        removed
    }

    /// Copy of the current list, so listeners may (un)register during dispatch
    fn snapshot(&self, node: NodeId, event_type: &str) -> Vec<Rc<ListenerFn>> {
        self.by_node
            .get(&node)
            .and_then(|types| types.get(event_type))
            .map(|list| list.iter().map(|r| Rc::clone(&r.callback)).collect())
            .unwrap_or_default()
    }

    fn count(&self, node: NodeId, event_type: &str) -> usize {
        self.by_node
            .get(&node)
            .and_then(|types| types.get(event_type))
            .map_or(0, Vec::len)
    }

    pub(crate) fn remove_node(&mut self, node: NodeId) {
        self.by_node.remove(&node);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.by_node.is_empty()
    }
}

impl DomTree {
    /// Register a listener for `event_type` on `target`.
    ///
    /// Use [`DomTree::document`] as target for global listeners.
    pub fn add_event_listener<F>(&mut self, target: NodeId, event_type: &str, listener: F) -> DomResult<ListenerId>
    where
        F: Fn(&mut Event, &mut DomTree) -> Result<(), ListenerError> + 'static,
    {
        if event_type.is_empty() {
            return Err(DomError::EmptyEventType);
        }
        self.node(target)?;
        Ok(self.listeners.add(target, event_type, Rc::new(listener)))
    }

    /// Remove a listener, returning whether it was registered
    pub fn remove_event_listener(&mut self, target: NodeId, event_type: &str, id: ListenerId) -> bool {
        self.listeners.remove(target, event_type, id)
    }

    pub fn listener_count(&self, target: NodeId, event_type: &str) -> usize {
        self.listeners.count(target, event_type)
    }

    /// Dispatch `event` at `target`.
    ///
    /// Runs the target's listeners, then each ancestor's if the event
    /// bubbles, then the document's unless the event was cancelled.
    /// `stop_propagation` ends dispatch after the current listener.
    /// Returns the finished event.
    pub fn dispatch_event(&mut self, target: NodeId, mut event: Event) -> DomResult<Event> {
        if !event.is_initialized() {
            return Err(DomError::EventNotInitialized(event.event_type().to_string()));
        }
        self.node(target)?;
        event.target = Some(target);

        if target != NodeId::DOCUMENT {
            event.phase = EventPhase::Origin;
            self.run_listeners(target, &mut event);

            if event.bubbles() {
                // Looked up per step so listener mutations are visible
                let mut current = self.parent(target);
                while let Some(node) = current {
                    if event.is_propagation_stopped() {
                        break;
                    }
                    event.phase = EventPhase::Bubbling;
                    self.run_listeners(node, &mut event);
                    current = self.parent(node);
                }
            }
        }

        if !event.is_cancelled() && !event.is_propagation_stopped() {
            event.phase = EventPhase::Global;
            self.run_listeners(NodeId::DOCUMENT, &mut event);
        }

        event.phase = EventPhase::Done;
        event.current_target = None;
        Ok(event)
    }

    fn run_listeners(&mut self, node: NodeId, event: &mut Event) {
        let snapshot = self.listeners.snapshot(node, event.event_type());
        if snapshot.is_empty() {
            return;
        }
        tracing::debug!(event = event.event_type(), phase = ?event.phase(), %node, "dispatching");

        event.current_target = Some(node);
        for listener in snapshot {
            if let Err(error) = listener(event, self) {
                tracing::error!(event = event.event_type(), %node, %error, "event listener failed");
            }
            if event.is_propagation_stopped() {
                break;
            }
        }
    }
}
