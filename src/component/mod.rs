//! Components and their render pipeline
//!
//! A [`Component`] owns one persistent root container. Every
//! [`render`](Component::render) rebuilds the container's content from
//! scratch:
//!
//! 1. build logic registers [`Bindings`] for the current [`Props`]
//! 2. the template is compiled against those bindings
//! 3. the compiled markup is parsed by the host and installed in the root
//! 4. post-processors prune hidden elements, compose children and attach
//!    event listeners
//! 5. the mount detector fires [`ComponentLogic::on_mount`] once the root
//!    is part of the live document
//!
//! There is no diffing: listeners, child roots and text nodes from the
//! previous render are discarded with the old content. Only the root's
//! identity survives, so an owner can attach it once and forget about
//! re-renders.
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//!
//! use domweave::component::{Component, Definition, Props};
//! use domweave::dom::MemoryDocument;
//!
//! let doc = Rc::new(MemoryDocument::new());
//! let greeting = Component::new(
//!     doc.clone(),
//!     Definition::new()
//!         .template("<p>Hello [[name]]</p>")
//!         .build(|props, b| {
//!             b.bind_text("name", props.get_str("name").unwrap_or("world"));
//!         }),
//!     Props::new().with("name", "Ada"),
//! );
//!
//! let root = greeting.render().unwrap();
//! assert_eq!(doc.inner_html(root), "<p>Hello Ada</p>");
//! ```

mod bindings;
mod definition;
mod mount;
mod postprocess;
mod props;

use std::borrow::Cow;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::config::RenderConfig;
use crate::dom::{DocumentHost, NodeId};
use crate::template;
use crate::RenderError;

pub use bindings::{Binding, Bindings, Child, EventHandler};
pub use definition::Definition;
pub use mount::MountState;
pub use props::Props;

use mount::MountTracker;

/// What a component type supplies to the pipeline.
///
/// `template` and `build` must be provided; the defaults fail with
/// [`RenderError::Unimplemented`] so a malformed definition is reported on
/// its first render.
pub trait ComponentLogic: 'static {
    /// Raw template with `[[tag]]` placeholders
    fn template(&self) -> Result<Cow<'_, str>, RenderError> {
        Err(RenderError::Unimplemented {
            operation: "template",
        })
    }

    /// Register this render's bindings for the current properties
    fn build(&self, props: &Props, bindings: &mut Bindings) -> Result<(), RenderError> {
        let _ = (props, bindings);
        Err(RenderError::Unimplemented { operation: "build" })
    }

    /// Called once, the first time the root is found in the live document
    fn on_mount(&self, component: &Component) {
        let _ = component;
    }
}

struct Inner {
    host: Rc<dyn DocumentHost>,
    logic: Box<dyn ComponentLogic>,
    config: RenderConfig,
    root: NodeId,
    props: RefCell<Props>,
    bindings: RefCell<Bindings>,
    mount: RefCell<MountTracker>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(observer) = self.mount.get_mut().take_observer() {
            self.host.disconnect(observer);
        }
    }
}

/// Shared handle to a component instance
#[derive(Clone)]
pub struct Component {
    inner: Rc<Inner>,
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("root", &self.inner.root)
            .field("props", &self.inner.props.borrow())
            .field("mount_state", &self.mount_state())
            .finish_non_exhaustive()
    }
}

impl Component {
    /// Create an unmounted component with an empty root container
    pub fn new(host: Rc<dyn DocumentHost>, logic: impl ComponentLogic, props: Props) -> Self {
        Self::with_config(host, logic, props, RenderConfig::default())
    }

    /// Create a component with explicit marker and root settings
    pub fn with_config(
        host: Rc<dyn DocumentHost>,
        logic: impl ComponentLogic,
        props: Props,
        config: RenderConfig,
    ) -> Self {
        let root = host.create_element(&config.root_tag);
        if !config.root_style.is_empty() {
            host.set_attribute(root, "style", &config.root_style);
        }

        Self {
            inner: Rc::new(Inner {
                host,
                logic: Box::new(logic),
                config,
                root,
                props: RefCell::new(props),
                bindings: RefCell::new(Bindings::new()),
                mount: RefCell::new(MountTracker::default()),
            }),
        }
    }

    fn upgrade(weak: &Weak<Inner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// The persistent root container
    pub fn root(&self) -> NodeId {
        self.inner.root
    }

    pub fn host(&self) -> &Rc<dyn DocumentHost> {
        &self.inner.host
    }

    pub fn config(&self) -> &RenderConfig {
        &self.inner.config
    }

    /// Snapshot of the current properties
    pub fn props(&self) -> Props {
        self.inner.props.borrow().clone()
    }

    /// Bindings registered by the most recent successful render
    pub fn bindings(&self) -> Ref<'_, Bindings> {
        self.inner.bindings.borrow()
    }

    pub fn mount_state(&self) -> MountState {
        self.inner.mount.borrow().state()
    }

    /// Whether two handles refer to the same instance
    pub fn ptr_eq(&self, other: &Component) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Rebuild the root's content and return the (unchanged) root.
    ///
    /// On error the root keeps the content of the previous successful
    /// render, unless a child component failed after materialization.
    pub fn render(&self) -> Result<NodeId, RenderError> {
        let inner = &self.inner;
        let host = inner.host.as_ref();
        log::debug!("rendering component {}", inner.root);

        let template = inner.logic.template()?;
        let mut bindings = Bindings::new();
        inner.logic.build(&inner.props.borrow(), &mut bindings)?;
        log::trace!("component {} registered {} binding(s)", inner.root, bindings.len());

        let markup = template::compile(template.trim(), &bindings, &inner.config);
        let nodes = host
            .parse_fragment(&markup)
            .map_err(|errors| RenderError::Markup { markup, errors })?;
        host.replace_children(inner.root, nodes);

        postprocess::prune_hidden(host, inner.root, &bindings, &inner.config);
        postprocess::compose_children(host, inner.root, &bindings, &inner.config)?;
        postprocess::bind_events(host, inner.root, &bindings, &inner.config, self);

        *inner.bindings.borrow_mut() = bindings;
        mount::detect(self);

        log::debug!("rendered component {}", inner.root);
        Ok(inner.root)
    }

    /// Shallow-merge `partial` into the properties, then render
    pub fn update_props(&self, partial: Props) -> Result<NodeId, RenderError> {
        self.inner.props.borrow_mut().merge(partial);
        self.render()
    }

    /// Stop any pending mount detection.
    ///
    /// Disconnects a registered mutation observer and cancels a deferred
    /// check. A mounted component stays mounted; a later render may start
    /// detection again.
    pub fn dispose(&self) {
        mount::dispose(self);
    }
}
