//! Post-processors run over a freshly materialized root
//!
//! Order matters: pruning runs first so that hidden subtrees never get
//! children composed into them or listeners attached.

use std::rc::Rc;

use super::{Binding, Bindings, Child, Component, EventHandler};
use crate::config::RenderConfig;
use crate::dom::{DocumentHost, Event, Listener, NodeId};
use crate::RenderError;

/// Remove elements whose visibility binding is `false` and strip the marker
/// attribute from every other marked element.
pub(super) fn prune_hidden(
    host: &dyn DocumentHost,
    root: NodeId,
    bindings: &Bindings,
    config: &RenderConfig,
) {
    let name = config.visibility_attribute.as_str();
    for element in host.elements_with_attribute(root, name) {
        let key = host.attribute(element, name).unwrap_or_default();
        match bindings.get(&key) {
            Some(Binding::Visibility(false)) => {
                log::trace!("pruning element {} hidden by '{}'", element, key);
                host.remove(element);
            }
            _ => host.remove_attribute(element, name),
        }
    }
}

/// Replace each component marker comment with the items of its children
/// binding, in order. Markers without a children binding are removed.
pub(super) fn compose_children(
    host: &dyn DocumentHost,
    root: NodeId,
    bindings: &Bindings,
    config: &RenderConfig,
) -> Result<(), RenderError> {
    let prefix = config.component_comment_prefix.as_str();
    for (marker, data) in host.comments(root) {
        let Some(key) = data.strip_prefix(prefix) else {
            continue;
        };
        let Some(parent) = host.parent(marker) else {
            continue;
        };

        if let Some(Binding::Children(items)) = bindings.get(key) {
            log::trace!("composing {} item(s) at '{}'", items.len(), key);
            for item in items {
                let node = match item {
                    Child::Component(child) => child.render()?,
                    Child::Node(node) if host.contains(*node) => *node,
                    Child::Node(node) => {
                        log::debug!("skipping unknown node {} in children of '{}'", node, key);
                        continue;
                    }
                    Child::Text(text) => host.create_text(text),
                };
                host.insert_before(parent, node, marker);
            }
        }
        host.remove(marker);
    }
    Ok(())
}

/// Attach a listener for every event key named by an element's marker
/// attribute, then strip the attribute.
///
/// Listeners keep their component alive, so a root that was attached once
/// keeps working after the owner drops its handle.
pub(super) fn bind_events(
    host: &dyn DocumentHost,
    root: NodeId,
    bindings: &Bindings,
    config: &RenderConfig,
    owner: &Component,
) {
    let name = config.event_attribute.as_str();
    for element in host.elements_with_attribute(root, name) {
        let keys = host.attribute(element, name).unwrap_or_default();
        for key in keys.split_whitespace() {
            if let Some(Binding::Event { event, handler }) = bindings.get(key) {
                log::trace!("binding '{}' on element {} for '{}'", event, element, key);
                host.add_event_listener(element, event, listener(handler.clone(), owner.clone()));
            }
        }
        host.remove_attribute(element, name);
    }
}

fn listener(handler: EventHandler, owner: Component) -> Listener {
    Rc::new(move |event: &mut Event| {
        event.stop_propagation();
        event.prevent_default();
        handler(&owner);
    })
}
