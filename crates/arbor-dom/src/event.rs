//! Events
//!
//! An [`Event`] carries its type, target, phase, propagation flags and a
//! typed payload. Built-in payload constructors return initialized events;
//! [`Event::new`] and [`Event::custom`] must be initialized before
//! dispatch.

use std::collections::HashMap;

use crate::NodeId;

/// Built-in event type names
pub mod event_types {
    pub const APPEND_CHILD: &str = "append-child";
    pub const REMOVE_CHILD: &str = "remove-child";
    pub const MODIFY_ATTR: &str = "modify-attribute";
    pub const MODIFY_OPTION: &str = "modify-option";
    pub const TEXT_CHANGE: &str = "text-change";
    pub const CLICK: &str = "click";
    pub const MOUSE_ENTER: &str = "mouse-enter";
    pub const MOUSE_LEAVE: &str = "mouse-exit";
    pub const MOUSE_MOVE: &str = "mouse-move";
    pub const DOM_LOADED: &str = "load";
    pub const DOM_CLOSING: &str = "close";
    pub const INPUT: &str = "input";
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Dispatch state machine: Origin -> Bubbling -> Global -> Done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventPhase {
    /// Not dispatched yet
    #[default]
    Idle,
    /// Listeners on the target itself
    Origin,
    /// Listeners on each ancestor, parent first
    Bubbling,
    /// Listeners on the document node
    Global,
    Done,
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    #[default]
    None,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollDirection {
    #[default]
    None,
    Up,
    Down,
}

/// Pointer input
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MouseEvent {
    pub button: MouseButton,
    pub scroll: ScrollDirection,
    pub shift: bool,
    /// Cursor position on the document surface
    pub screen_position: (f32, f32),
    /// Cursor position in host world space
    pub world_position: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeAction {
    Add,
    Set,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMutation {
    pub key: String,
    pub previous: Option<String>,
    pub value: Option<String>,
    pub action: AttributeAction,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum EventPayload {
    #[default]
    None,
    Mouse(MouseEvent),
    /// Node added or removed
    Mutation(NodeId),
    AttributeMutate(AttributeMutation),
    /// Text node whose content changed
    TextChange(NodeId),
    Custom(HashMap<String, String>),
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Event {
    event_type: String,
    pub(crate) target: Option<NodeId>,
    pub(crate) current_target: Option<NodeId>,
    pub(crate) phase: EventPhase,
    bubbles: bool,
    cancelable: bool,
    cancelled: bool,
    propagation_stopped: bool,
    initialized: bool,
    payload: EventPayload,
}

impl Event {
    /// Uninitialized event of the given type; call [`Event::init`] before dispatch
    pub fn new(event_type: &str) -> Self {
        Self {
            event_type: event_type.to_string(),
            target: None,
            current_target: None,
            phase: EventPhase::Idle,
            bubbles: false,
            cancelable: false,
            cancelled: false,
            propagation_stopped: false,
            initialized: false,
            payload: EventPayload::None,
        }
    }

    fn initialized(event_type: &str, bubbles: bool, cancelable: bool, payload: EventPayload) -> Self {
        let mut event = Self::new(event_type);
        event.payload = payload;
        event.init(bubbles, cancelable);
        event
    }

    /// Pointer event; bubbles and is cancelable
    pub fn mouse(event_type: &str, data: MouseEvent) -> Self {
        Self::initialized(event_type, true, true, EventPayload::Mouse(data))
    }

    /// Child added/removed notification
    pub fn mutation(event_type: &str, node: NodeId) -> Self {
        Self::initialized(event_type, true, false, EventPayload::Mutation(node))
    }

    pub fn attribute_mutate(event_type: &str, mutation: AttributeMutation) -> Self {
        Self::initialized(event_type, true, false, EventPayload::AttributeMutate(mutation))
    }

    pub fn text_change(node: NodeId) -> Self {
        Self::initialized(event_types::TEXT_CHANGE, true, false, EventPayload::TextChange(node))
    }

    /// Custom event with an empty property bag; call [`Event::init_custom`]
    pub fn custom(event_type: &str) -> Self {
        let mut event = Self::new(event_type);
        event.payload = EventPayload::Custom(HashMap::new());
        event
    }

    /// Establish the flag set. An empty type never becomes initialized.
    pub fn init(&mut self, bubbles: bool, cancelable: bool) {
        self.bubbles = bubbles;
        self.cancelable = cancelable;
        self.initialized = !self.event_type.is_empty();
    }

    pub fn init_custom(&mut self, bubbles: bool, cancelable: bool, properties: HashMap<String, String>) {
        self.payload = EventPayload::Custom(properties);
        self.init(bubbles, cancelable);
    }

    // ---- Accessors ----

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target
    }

    pub fn phase(&self) -> EventPhase {
        self.phase
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn cancelable(&self) -> bool {
        self.cancelable
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    pub fn mouse_data(&self) -> Option<&MouseEvent> {
        match &self.payload {
            EventPayload::Mouse(m) => Some(m),
            _ => None,
        }
    }

    pub fn attribute_mutation(&self) -> Option<&AttributeMutation> {
        match &self.payload {
            EventPayload::AttributeMutate(m) => Some(m),
            _ => None,
        }
    }

    /// Node carried by a mutation or text change payload
    pub fn related_node(&self) -> Option<NodeId> {
        match self.payload {
            EventPayload::Mutation(n) | EventPayload::TextChange(n) => Some(n),
            _ => None,
        }
    }

    /// Property of a custom event
    pub fn property(&self, key: &str) -> Option<&str> {
        match &self.payload {
            EventPayload::Custom(props) => props.get(key).map(String::as_str),
            _ => None,
        }
    }

    // ---- Control ----

    /// Halt the remaining listeners on the current node and every later phase
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Cancel a cancelable event; the global phase is skipped
    pub fn cancel(&mut self) {
        if self.cancelable {
            self.cancelled = true;
        }
    }
}
