//! Template compilation
//!
//! Rewrites `[[tag]]` placeholders in a raw template according to the
//! component's bindings, producing markup the document host can parse.
//! Placeholders become marker attributes, marker comments or literal text;
//! post-processing later resolves the markers into real DOM effects.
//!
//! # Example
//!
//! ```rust
//! use domweave::component::Bindings;
//! use domweave::template::compile;
//! use domweave::RenderConfig;
//!
//! let mut bindings = Bindings::new();
//! bindings.bind_text("name", "Ada").bind_visibility("admin", false);
//!
//! let markup = compile(
//!     "<p [[admin]]>Hello [[name]]</p>",
//!     &bindings,
//!     &RenderConfig::default(),
//! );
//! assert_eq!(markup, r#"<p data-vis="admin">Hello Ada</p>"#);
//! ```

mod compiler;
mod scanner;

pub use compiler::{attribute_pass, compile, content_pass};
pub use scanner::{scan, Segment};
