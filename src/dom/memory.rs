//! In-memory document host
//!
//! An arena of nodes hanging off a document node, with a `<body>` element
//! that is connected from the start. Mutation observers and microtasks are
//! queued rather than run inline; [`MemoryDocument::run_microtasks`] plays
//! the role of the event loop reaching a microtask checkpoint.
//!
//! Nodes are never freed. A detached subtree, including the listeners on
//! it, stays in the arena for the lifetime of the document, so every full
//! rebuild grows it. That suits tests and one-shot CLI renders; a long-lived
//! host should reclaim detached nodes itself.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use super::{
    DocumentHost, Event, HostCapabilities, Listener, Microtask, MutationCallback, NodeId,
    ObserverId,
};
use crate::error::ParseError;
use crate::markup::{self, entities};

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<(String, Listener)>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }
}

struct ObserverEntry {
    id: ObserverId,
    callback: MutationCallback,
    pending: bool,
}

enum Job {
    Task(Microtask),
    DeliverMutations,
}

/// Arena-backed [`DocumentHost`]
pub struct MemoryDocument {
    nodes: RefCell<Vec<NodeData>>,
    document: NodeId,
    body: NodeId,
    capabilities: HostCapabilities,
    observers: RefCell<Vec<ObserverEntry>>,
    next_observer: Cell<usize>,
    delivery_queued: Cell<bool>,
    queue: RefCell<VecDeque<Job>>,
}

impl std::fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("nodes", &self.nodes.borrow().len())
            .field("capabilities", &self.capabilities)
            .field("observers", &self.observers.borrow().len())
            .field("queued", &self.queue.borrow().len())
            .finish()
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Create a document with every optional capability enabled
    pub fn new() -> Self {
        Self::with_capabilities(HostCapabilities::default())
    }

    /// Create a document with a chosen set of optional capabilities
    pub fn with_capabilities(capabilities: HostCapabilities) -> Self {
        let document = NodeId::new(0);
        let body = NodeId::new(1);
        let mut root = NodeData::new(NodeKind::Document);
        root.children.push(body);
        let mut body_data = NodeData::new(NodeKind::Element {
            tag: "body".to_string(),
            attributes: Vec::new(),
        });
        body_data.parent = Some(document);

        Self {
            nodes: RefCell::new(vec![root, body_data]),
            document,
            body,
            capabilities,
            observers: RefCell::new(Vec::new()),
            next_observer: Cell::new(0),
            delivery_queued: Cell::new(false),
            queue: RefCell::new(VecDeque::new()),
        }
    }

    /// The document node itself
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// The live `<body>` element
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Lower-cased tag name of an element
    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        match &self.nodes.borrow().get(node.index())?.kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            _ => None,
        }
    }

    /// Data of a text or comment node
    pub fn data(&self, node: NodeId) -> Option<String> {
        match &self.nodes.borrow().get(node.index())?.kind {
            NodeKind::Text(data) | NodeKind::Comment(data) => Some(data.clone()),
            _ => None,
        }
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, node: NodeId) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        collect_text(&nodes, node, &mut out);
        out
    }

    /// Number of listeners registered on a node for an event name
    pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
        self.nodes
            .borrow()
            .get(node.index())
            .map(|n| n.listeners.iter().filter(|(name, _)| name == event).count())
            .unwrap_or(0)
    }

    /// Number of registered mutation observers
    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    /// Number of jobs waiting for the next microtask checkpoint
    pub fn pending_microtasks(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Serialize the children of a node
    pub fn inner_html(&self, node: NodeId) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        if let Some(data) = nodes.get(node.index()) {
            for child in &data.children {
                write_node(&nodes, *child, &mut out);
            }
        }
        out
    }

    /// Serialize a node including itself
    pub fn outer_html(&self, node: NodeId) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        write_node(&nodes, node, &mut out);
        out
    }

    /// First descendant element with the given tag, in document order
    pub fn find_element(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        let nodes = self.nodes.borrow();
        descendants(&nodes, root).into_iter().find(|id| {
            matches!(&nodes[id.index()].kind, NodeKind::Element { tag: t, .. } if t == tag)
        })
    }

    /// Dispatch an event at `target`, bubbling through its ancestors.
    ///
    /// Listeners on the current node all run even if one of them stops
    /// propagation; ancestors are skipped afterwards.
    pub fn dispatch_event(&self, target: NodeId, name: &str) -> Event {
        let mut event = Event::new(name, target);
        let mut current = Some(target);

        while let Some(node) = current {
            event.set_current_target(node);
            let (listeners, parent): (Vec<Listener>, Option<NodeId>) = {
                let nodes = self.nodes.borrow();
                match nodes.get(node.index()) {
                    Some(data) => (
                        data.listeners
                            .iter()
                            .filter(|(event_name, _)| event_name == name)
                            .map(|(_, l)| l.clone())
                            .collect(),
                        data.parent,
                    ),
                    None => (Vec::new(), None),
                }
            };
            for listener in listeners {
                listener(&mut event);
            }
            if event.propagation_stopped() {
                break;
            }
            current = parent;
        }

        event
    }

    /// Run queued microtasks and mutation deliveries until the queue is empty.
    ///
    /// Returns the number of jobs run.
    pub fn run_microtasks(&self) -> usize {
        let mut ran = 0;
        loop {
            let job = self.queue.borrow_mut().pop_front();
            match job {
                None => break,
                Some(Job::Task(task)) => task(),
                Some(Job::DeliverMutations) => {
                    self.delivery_queued.set(false);
                    let callbacks: Vec<MutationCallback> = self
                        .observers
                        .borrow_mut()
                        .iter_mut()
                        .filter(|o| o.pending)
                        .map(|o| {
                            o.pending = false;
                            o.callback.clone()
                        })
                        .collect();
                    log::trace!("delivering mutations to {} observer(s)", callbacks.len());
                    for callback in callbacks {
                        callback();
                    }
                }
            }
            ran += 1;
        }
        ran
    }

    fn alloc(&self, kind: NodeKind) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(NodeData::new(kind));
        NodeId::new(nodes.len() - 1)
    }

    /// Queue a mutation record if the change happened inside the document
    fn record_mutation(&self, parent: NodeId) {
        if self.observers.borrow().is_empty() || !self.is_connected(parent) {
            return;
        }
        for observer in self.observers.borrow_mut().iter_mut() {
            observer.pending = true;
        }
        if !self.delivery_queued.get() {
            self.delivery_queued.set(true);
            self.queue.borrow_mut().push_back(Job::DeliverMutations);
        }
    }

    /// Unlink a node from its parent, returning the former parent
    fn detach(&self, node: NodeId) -> Option<NodeId> {
        let mut nodes = self.nodes.borrow_mut();
        let parent = nodes.get_mut(node.index())?.parent.take()?;
        nodes[parent.index()].children.retain(|c| *c != node);
        Some(parent)
    }

    /// Whether `node` is `other` or one of its ancestors
    fn is_inclusive_ancestor(&self, node: NodeId, other: NodeId) -> bool {
        let nodes = self.nodes.borrow();
        let mut current = Some(other);
        while let Some(id) = current {
            if id == node {
                return true;
            }
            current = nodes.get(id.index()).and_then(|n| n.parent);
        }
        false
    }

    fn can_insert(&self, parent: NodeId, child: NodeId) -> bool {
        if !self.contains(parent) || !self.contains(child) {
            log::warn!("insert of unknown node {} into {}", child, parent);
            return false;
        }
        if self.is_inclusive_ancestor(child, parent) {
            log::warn!("refusing to insert {} into its own subtree", child);
            return false;
        }
        true
    }

    fn build(nodes: &mut Vec<NodeData>, source: &markup::Node, parent: Option<NodeId>) -> NodeId {
        let kind = match source {
            markup::Node::Element {
                name, attributes, ..
            } => NodeKind::Element {
                tag: name.clone(),
                attributes: attributes
                    .iter()
                    .map(|a| (a.name.clone(), a.value.clone()))
                    .collect(),
            },
            markup::Node::Text(text) => NodeKind::Text(text.clone()),
            markup::Node::Comment(data) => NodeKind::Comment(data.clone()),
        };
        let mut data = NodeData::new(kind);
        data.parent = parent;
        nodes.push(data);
        let id = NodeId::new(nodes.len() - 1);

        for child in source.children() {
            let child_id = Self::build(nodes, child, Some(id));
            nodes[id.index()].children.push(child_id);
        }
        id
    }
}

fn descendants(nodes: &[NodeData], root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeId> = match nodes.get(root.index()) {
        Some(data) => data.children.iter().rev().copied().collect(),
        None => return out,
    };
    while let Some(id) = stack.pop() {
        out.push(id);
        stack.extend(nodes[id.index()].children.iter().rev().copied());
    }
    out
}

fn collect_text(nodes: &[NodeData], node: NodeId, out: &mut String) {
    let Some(data) = nodes.get(node.index()) else {
        return;
    };
    match &data.kind {
        NodeKind::Text(text) => out.push_str(text),
        NodeKind::Comment(_) => {}
        _ => {
            for child in &data.children {
                collect_text(nodes, *child, out);
            }
        }
    }
}

fn write_node(nodes: &[NodeData], node: NodeId, out: &mut String) {
    let Some(data) = nodes.get(node.index()) else {
        return;
    };
    match &data.kind {
        NodeKind::Document => {
            for child in &data.children {
                write_node(nodes, *child, out);
            }
        }
        NodeKind::Element { tag, attributes } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attributes {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&entities::escape_attribute(value));
                out.push('"');
            }
            out.push('>');
            if markup::is_void(tag) {
                return;
            }
            for child in &data.children {
                write_node(nodes, *child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        NodeKind::Text(text) => out.push_str(&entities::escape_text(text)),
        NodeKind::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
    }
}

impl DocumentHost for MemoryDocument {
    fn capabilities(&self) -> HostCapabilities {
        self.capabilities
    }

    fn create_element(&self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        })
    }

    fn create_text(&self, data: &str) -> NodeId {
        self.alloc(NodeKind::Text(data.to_string()))
    }

    fn create_comment(&self, data: &str) -> NodeId {
        self.alloc(NodeKind::Comment(data.to_string()))
    }

    fn parse_fragment(&self, markup: &str) -> Result<Vec<NodeId>, Vec<ParseError>> {
        let parsed = markup::parse_fragment(markup)?;
        let mut nodes = self.nodes.borrow_mut();
        Ok(parsed
            .iter()
            .map(|node| Self::build(&mut nodes, node, None))
            .collect())
    }

    fn contains(&self, node: NodeId) -> bool {
        node.index() < self.nodes.borrow().len()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.borrow().get(node.index())?.parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .borrow()
            .get(node.index())
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn append_child(&self, parent: NodeId, child: NodeId) {
        if !self.can_insert(parent, child) {
            return;
        }
        if let Some(old_parent) = self.detach(child) {
            self.record_mutation(old_parent);
        }
        {
            let mut nodes = self.nodes.borrow_mut();
            nodes[parent.index()].children.push(child);
            nodes[child.index()].parent = Some(parent);
        }
        self.record_mutation(parent);
    }

    fn insert_before(&self, parent: NodeId, child: NodeId, reference: NodeId) {
        if child == reference || !self.can_insert(parent, child) {
            return;
        }
        if self.parent(reference) != Some(parent) {
            log::warn!(
                "reference {} is not a child of {}, appending instead",
                reference,
                parent
            );
            self.append_child(parent, child);
            return;
        }
        if let Some(old_parent) = self.detach(child) {
            self.record_mutation(old_parent);
        }
        {
            let mut nodes = self.nodes.borrow_mut();
            let siblings = &mut nodes[parent.index()].children;
            let position = siblings
                .iter()
                .position(|c| *c == reference)
                .unwrap_or(siblings.len());
            siblings.insert(position, child);
            nodes[child.index()].parent = Some(parent);
        }
        self.record_mutation(parent);
    }

    fn replace_children(&self, parent: NodeId, children: Vec<NodeId>) {
        if !self.contains(parent) {
            return;
        }
        let old = std::mem::take(&mut self.nodes.borrow_mut()[parent.index()].children);
        {
            let mut nodes = self.nodes.borrow_mut();
            for child in old {
                nodes[child.index()].parent = None;
            }
        }
        self.record_mutation(parent);
        for child in children {
            self.append_child(parent, child);
        }
    }

    fn remove(&self, node: NodeId) {
        if let Some(parent) = self.detach(node) {
            self.record_mutation(parent);
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.nodes.borrow().get(node.index())?.kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        let mut nodes = self.nodes.borrow_mut();
        if let Some(NodeKind::Element { attributes, .. }) =
            nodes.get_mut(node.index()).map(|n| &mut n.kind)
        {
            match attributes.iter_mut().find(|(n, _)| n == name) {
                Some((_, existing)) => *existing = value.to_string(),
                None => attributes.push((name.to_string(), value.to_string())),
            }
        }
    }

    fn remove_attribute(&self, node: NodeId, name: &str) {
        let mut nodes = self.nodes.borrow_mut();
        if let Some(NodeKind::Element { attributes, .. }) =
            nodes.get_mut(node.index()).map(|n| &mut n.kind)
        {
            attributes.retain(|(n, _)| n != name);
        }
    }

    fn elements_with_attribute(&self, root: NodeId, name: &str) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        descendants(&nodes, root)
            .into_iter()
            .filter(|id| match &nodes[id.index()].kind {
                NodeKind::Element { attributes, .. } => attributes.iter().any(|(n, _)| n == name),
                _ => false,
            })
            .collect()
    }

    fn comments(&self, root: NodeId) -> Vec<(NodeId, String)> {
        let nodes = self.nodes.borrow();
        descendants(&nodes, root)
            .into_iter()
            .filter_map(|id| match &nodes[id.index()].kind {
                NodeKind::Comment(data) => Some((id, data.clone())),
                _ => None,
            })
            .collect()
    }

    fn add_event_listener(&self, node: NodeId, event: &str, listener: Listener) {
        if let Some(data) = self.nodes.borrow_mut().get_mut(node.index()) {
            data.listeners.push((event.to_string(), listener));
        }
    }

    fn is_connected(&self, node: NodeId) -> bool {
        let nodes = self.nodes.borrow();
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.document {
                return true;
            }
            current = nodes.get(id.index()).and_then(|n| n.parent);
        }
        false
    }

    fn observe_mutations(&self, callback: MutationCallback) -> Option<ObserverId> {
        if !self.capabilities.mutation_observer {
            return None;
        }
        let id = ObserverId::new(self.next_observer.get());
        self.next_observer.set(self.next_observer.get() + 1);
        self.observers.borrow_mut().push(ObserverEntry {
            id,
            callback,
            pending: false,
        });
        Some(id)
    }

    fn disconnect(&self, observer: ObserverId) {
        self.observers.borrow_mut().retain(|o| o.id != observer);
    }

    fn queue_microtask(&self, task: Microtask) -> bool {
        if !self.capabilities.microtasks {
            return false;
        }
        self.queue.borrow_mut().push_back(Job::Task(task));
        true
    }
}
