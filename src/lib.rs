//! domweave - template-driven components over a document tree
//!
//! A component pairs a raw template containing `[[tag]]` placeholders with
//! build logic that says, per tag, whether it becomes text, toggles an
//! element's presence, attaches an event listener, or composes child
//! content. Each render rebuilds the component's persistent root from
//! scratch and tracks when that root first joins the live document.
//!
//! # Example
//!
//! ```rust
//! let html = domweave::render_template(
//!     "<p [[shown]]>[[greeting]]</p><p [[hidden]]>gone</p>",
//!     &r#"
//!         shown = true
//!         hidden = false
//!         greeting = "Hello"
//!     "#
//!     .parse::<toml::Table>()
//!     .unwrap(),
//! )
//! .unwrap();
//!
//! assert_eq!(html, "<p>Hello</p>");
//! ```

pub mod component;
pub mod config;
pub mod dom;
pub mod error;
pub mod markup;
pub mod template;

use std::rc::Rc;

pub use component::{Binding, Bindings, Child, Component, ComponentLogic, Definition, MountState, Props};
pub use config::{ConfigError, RenderConfig};
pub use dom::{DocumentHost, HostCapabilities, MemoryDocument, NodeId};
pub use error::ParseError;

use thiserror::Error;

/// Errors that abort a render
#[derive(Debug, Error)]
pub enum RenderError {
    /// A component definition lacks a required part
    #[error("component does not implement '{operation}'")]
    Unimplemented { operation: &'static str },

    /// The host rejected the compiled template
    #[error("markup errors: {}", format_parse_errors(.errors))]
    Markup {
        markup: String,
        errors: Vec<ParseError>,
    },
}

impl RenderError {
    /// Diagnostics for a markup error, rendered against the compiled markup
    pub fn report(&self, filename: &str) -> Option<String> {
        match self {
            RenderError::Markup { markup, errors } => Some(
                errors
                    .iter()
                    .map(|e| e.format(markup, filename))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            RenderError::Unimplemented { .. } => None,
        }
    }
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Render a template against data-driven bindings with default settings.
///
/// See [`render_template_with_config`].
pub fn render_template(template: &str, bindings: &toml::Table) -> Result<String, RenderError> {
    render_template_with_config(template, bindings, RenderConfig::default())
}

/// Render a template in a fresh [`MemoryDocument`] and return the root's
/// inner HTML.
///
/// Every entry of `bindings` goes through [`Bindings::register`], so only
/// text, visibility and text-only children bindings are expressible.
///
/// ```rust
/// use domweave::{render_template_with_config, RenderConfig};
///
/// let config = RenderConfig::new().with_escape_text(true);
/// let html = render_template_with_config(
///     "<b>[[name]]</b>",
///     &r#"name = "<Ada>""#.parse::<toml::Table>().unwrap(),
///     config,
/// )
/// .unwrap();
/// assert_eq!(html, "<b>&lt;Ada&gt;</b>");
/// ```
pub fn render_template_with_config(
    template: &str,
    bindings: &toml::Table,
    config: RenderConfig,
) -> Result<String, RenderError> {
    let doc = Rc::new(MemoryDocument::new());
    let data = bindings.clone();
    let component = Component::with_config(
        doc.clone(),
        Definition::new()
            .template(template.to_string())
            .build(move |_, b| {
                b.register_all(&data);
            }),
        Props::new(),
        config,
    );
    let root = component.render()?;
    Ok(doc.inner_html(root))
}
