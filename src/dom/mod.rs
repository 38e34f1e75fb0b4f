//! Document host abstraction
//!
//! Components never touch a concrete document. Everything the pipeline needs
//! from the outside world (creating nodes, parsing markup, querying the tree,
//! attaching listeners, and learning when a node joins the live document)
//! goes through [`DocumentHost`]. [`MemoryDocument`] is the in-process host
//! used by the CLI and the tests; a browser binding would implement the same
//! trait over real DOM nodes.
//!
//! Hosts use interior mutability: mutation observers, microtasks and event
//! listeners call back into components, which in turn call back into the
//! host, so every method takes `&self`.

pub mod memory;

use std::fmt;
use std::rc::Rc;

use crate::error::ParseError;

pub use memory::MemoryDocument;

/// Identity of a node owned by a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle for a registered mutation observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(usize);

impl ObserverId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }
}

/// A dispatched event as seen by listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    name: String,
    target: NodeId,
    current_target: NodeId,
    propagation_stopped: bool,
    default_prevented: bool,
}

impl Event {
    pub fn new(name: impl Into<String>, target: NodeId) -> Self {
        Self {
            name: name.into(),
            target,
            current_target: target,
            propagation_stopped: false,
            default_prevented: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node the event was dispatched on
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Node whose listeners are currently running
    pub fn current_target(&self) -> NodeId {
        self.current_target
    }

    pub fn set_current_target(&mut self, node: NodeId) {
        self.current_target = node;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Callback attached to a node for one event name
pub type Listener = Rc<dyn Fn(&mut Event)>;

/// Callback notified after the document tree changed
pub type MutationCallback = Rc<dyn Fn()>;

/// Work deferred to the host's microtask queue
pub type Microtask = Box<dyn FnOnce()>;

/// Optional host features the mount detector can use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    /// Document-wide subtree mutation observation
    pub mutation_observer: bool,
    /// Deferring work to a microtask
    pub microtasks: bool,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self {
            mutation_observer: true,
            microtasks: true,
        }
    }
}

impl HostCapabilities {
    /// A host with neither observation nor deferral
    pub fn none() -> Self {
        Self {
            mutation_observer: false,
            microtasks: false,
        }
    }
}

/// The document operations the render pipeline depends on
pub trait DocumentHost {
    fn capabilities(&self) -> HostCapabilities;

    fn create_element(&self, tag: &str) -> NodeId;
    fn create_text(&self, data: &str) -> NodeId;
    fn create_comment(&self, data: &str) -> NodeId;

    /// Parse markup into detached top-level nodes
    fn parse_fragment(&self, markup: &str) -> Result<Vec<NodeId>, Vec<ParseError>>;

    /// Whether the host owns a node with this id
    fn contains(&self, node: NodeId) -> bool;
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Append `child`, detaching it from any previous parent first
    fn append_child(&self, parent: NodeId, child: NodeId);
    /// Insert `child` immediately before `reference`, a child of `parent`
    fn insert_before(&self, parent: NodeId, child: NodeId, reference: NodeId);
    /// Make `children` the sole content of `parent`
    fn replace_children(&self, parent: NodeId, children: Vec<NodeId>);
    /// Detach a node from its parent
    fn remove(&self, node: NodeId);

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;
    fn set_attribute(&self, node: NodeId, name: &str, value: &str);
    fn remove_attribute(&self, node: NodeId, name: &str);

    /// Descendant elements of `root` carrying `name`, in document order
    fn elements_with_attribute(&self, root: NodeId, name: &str) -> Vec<NodeId>;
    /// Descendant comments of `root` with their data, in document order
    fn comments(&self, root: NodeId) -> Vec<(NodeId, String)>;

    fn add_event_listener(&self, node: NodeId, event: &str, listener: Listener);

    /// Whether the node is part of the live document
    fn is_connected(&self, node: NodeId) -> bool;

    /// Observe subtree mutations of the whole document.
    ///
    /// Returns `None` when the host cannot observe mutations.
    fn observe_mutations(&self, callback: MutationCallback) -> Option<ObserverId>;
    fn disconnect(&self, observer: ObserverId);

    /// Defer a task to the next microtask checkpoint.
    ///
    /// Returns `false` (and drops the task) when the host cannot defer work.
    fn queue_microtask(&self, task: Microtask) -> bool;
}
