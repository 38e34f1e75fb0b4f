//! Mount detection
//!
//! A component starts out [`MountState::Unmounted`]. After each render the
//! detector checks whether the root is already in the live document; if not
//! it waits, preferring a document-wide mutation observer and falling back
//! to a single deferred check. A pending deferred check leaves the state at
//! `Unmounted`; only an observer moves it to `Observing`. `on_mount` fires
//! at most once per instance.

use std::rc::Rc;

use super::Component;
use crate::dom::{MutationCallback, ObserverId};

/// Where a component is in its mount lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MountState {
    #[default]
    Unmounted,
    /// Waiting on a mutation observer
    Observing,
    /// Terminal
    Mounted,
}

#[derive(Debug, Default)]
pub(super) struct MountTracker {
    state: MountState,
    observer: Option<ObserverId>,
    /// Generation of the pending deferred check
    deferred: Option<u64>,
    generation: u64,
}

impl MountTracker {
    pub(super) fn state(&self) -> MountState {
        self.state
    }

    pub(super) fn take_observer(&mut self) -> Option<ObserverId> {
        self.observer.take()
    }
}

/// Run after every render
pub(super) fn detect(component: &Component) {
    let inner = &component.inner;
    let state = inner.mount.borrow().state;
    match state {
        MountState::Mounted => return,
        _ if inner.host.is_connected(inner.root) => {
            mark_mounted(component);
            return;
        }
        MountState::Observing => return,
        MountState::Unmounted => {}
    }
    if inner.mount.borrow().deferred.is_some() {
        return;
    }

    let capabilities = inner.host.capabilities();

    if capabilities.mutation_observer {
        let owner = Rc::downgrade(inner);
        let callback: MutationCallback = Rc::new(move || {
            if let Some(component) = Component::upgrade(&owner) {
                observed_mutation(&component);
            }
        });
        if let Some(observer) = inner.host.observe_mutations(callback) {
            log::trace!("component {} observing mutations as {:?}", inner.root, observer);
            let mut tracker = inner.mount.borrow_mut();
            tracker.state = MountState::Observing;
            tracker.observer = Some(observer);
            return;
        }
    }

    if capabilities.microtasks {
        let generation = {
            let mut tracker = inner.mount.borrow_mut();
            tracker.generation += 1;
            tracker.generation
        };
        let owner = Rc::downgrade(inner);
        let queued = inner.host.queue_microtask(Box::new(move || {
            if let Some(component) = Component::upgrade(&owner) {
                deferred_check(&component, generation);
            }
        }));
        if queued {
            log::trace!("component {} deferred its mount check", inner.root);
            inner.mount.borrow_mut().deferred = Some(generation);
            return;
        }
    }

    log::debug!(
        "host cannot observe or defer, component {} rechecks on next render",
        inner.root
    );
}

fn observed_mutation(component: &Component) {
    let inner = &component.inner;
    // a batch collected before dispose may still arrive
    if inner.mount.borrow().observer.is_none() {
        return;
    }
    if inner.host.is_connected(inner.root) {
        mark_mounted(component);
    }
}

fn deferred_check(component: &Component, generation: u64) {
    let inner = &component.inner;
    {
        let mut tracker = inner.mount.borrow_mut();
        if tracker.deferred != Some(generation) {
            return;
        }
        tracker.deferred = None;
    }

    if inner.host.is_connected(inner.root) {
        mark_mounted(component);
    } else {
        log::debug!("component {} still detached after deferred check", inner.root);
    }
}

fn mark_mounted(component: &Component) {
    let inner = &component.inner;
    let observer = {
        let mut tracker = inner.mount.borrow_mut();
        if tracker.state == MountState::Mounted {
            return;
        }
        tracker.state = MountState::Mounted;
        tracker.deferred = None;
        tracker.observer.take()
    };
    if let Some(observer) = observer {
        inner.host.disconnect(observer);
    }

    log::debug!("component {} mounted", inner.root);
    inner.logic.on_mount(component);
}

pub(super) fn dispose(component: &Component) {
    let inner = &component.inner;
    log::debug!("disposing component {}", inner.root);
    let observer = {
        let mut tracker = inner.mount.borrow_mut();
        tracker.deferred = None;
        if tracker.state == MountState::Observing {
            tracker.state = MountState::Unmounted;
        }
        tracker.observer.take()
    };
    if let Some(observer) = observer {
        log::trace!("component {} disconnecting {:?}", inner.root, observer);
        inner.host.disconnect(observer);
    }
}
