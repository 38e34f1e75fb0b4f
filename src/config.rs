//! Configuration for the render pipeline
//!
//! Marker names and the shape of the persistent root container are
//! configurable so that generated markup never collides with attributes or
//! comments an application already uses. Every field has a default; a TOML
//! file only needs to name what it changes:
//!
//! ```toml
//! visibility_attribute = "data-show"
//! root_tag = "section"
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Configuration options for compiling and materializing components
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Attribute marking elements whose presence depends on a visibility binding
    pub visibility_attribute: String,

    /// Attribute listing the event bindings of an element
    pub event_attribute: String,

    /// Prefix of the comment marking where children are composed
    pub component_comment_prefix: String,

    /// Tag of the persistent root container
    pub root_tag: String,

    /// Inline style of the root container; by default it has no layout box
    pub root_style: String,

    /// HTML-escape text bindings before substitution
    pub escape_text: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            visibility_attribute: "data-vis".to_string(),
            event_attribute: "data-on".to_string(),
            component_comment_prefix: "COMPONENT:".to_string(),
            root_tag: "div".to_string(),
            root_style: "display: contents".to_string(),
            escape_text: false,
        }
    }
}

impl RenderConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Set the visibility marker attribute
    pub fn with_visibility_attribute(mut self, name: impl Into<String>) -> Self {
        self.visibility_attribute = name.into();
        self
    }

    /// Set the event marker attribute
    pub fn with_event_attribute(mut self, name: impl Into<String>) -> Self {
        self.event_attribute = name.into();
        self
    }

    /// Set the composition comment prefix
    pub fn with_component_comment_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.component_comment_prefix = prefix.into();
        self
    }

    /// Set the root container tag
    pub fn with_root_tag(mut self, tag: impl Into<String>) -> Self {
        self.root_tag = tag.into();
        self
    }

    /// Set the root container inline style
    pub fn with_root_style(mut self, style: impl Into<String>) -> Self {
        self.root_style = style.into();
        self
    }

    /// Enable or disable escaping of text bindings
    pub fn with_escape_text(mut self, escape: bool) -> Self {
        self.escape_text = escape;
        self
    }
}
