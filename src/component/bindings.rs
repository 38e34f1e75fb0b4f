//! Bindings produced by a component's build logic
//!
//! Build logic runs once per render and describes, per template tag, how
//! that tag affects the rendered tree. The typed `bind_*` methods are the
//! normal way in; [`Bindings::register`] keeps the permissive, shape-driven
//! path for data-driven callers such as the CLI.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use toml::Value;

use super::Component;
use crate::dom::NodeId;

/// User callback for an event binding; receives the owning component
pub type EventHandler = Rc<dyn Fn(&Component)>;

/// One item of a children binding
#[derive(Clone)]
pub enum Child {
    /// Rendered on every parent render; its root node is inserted
    Component(Component),
    /// An existing host node, inserted as-is
    Node(NodeId),
    /// Inserted as a text node
    Text(String),
}

impl fmt::Debug for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Child::Component(c) => f.debug_tuple("Component").field(&c.root()).finish(),
            Child::Node(n) => f.debug_tuple("Node").field(n).finish(),
            Child::Text(t) => f.debug_tuple("Text").field(t).finish(),
        }
    }
}

impl From<Component> for Child {
    fn from(component: Component) -> Self {
        Child::Component(component)
    }
}

impl From<&Component> for Child {
    fn from(component: &Component) -> Self {
        Child::Component(component.clone())
    }
}

impl From<NodeId> for Child {
    fn from(node: NodeId) -> Self {
        Child::Node(node)
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(text.to_string())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

/// How one template tag affects the rendered tree
#[derive(Clone)]
pub enum Binding {
    /// Substituted as literal content
    Text(String),
    /// Presence switch for the element carrying the tag
    Visibility(bool),
    /// Listener for `event` on the element carrying the tag
    Event { event: String, handler: EventHandler },
    /// Items composed at the tag's position
    Children(Vec<Child>),
}

impl Binding {
    /// Short name of the binding kind, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Binding::Text(_) => "text",
            Binding::Visibility(_) => "visibility",
            Binding::Event { .. } => "event",
            Binding::Children(_) => "children",
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Text(t) => f.debug_tuple("Text").field(t).finish(),
            Binding::Visibility(v) => f.debug_tuple("Visibility").field(v).finish(),
            Binding::Event { event, .. } => f
                .debug_struct("Event")
                .field("event", event)
                .finish_non_exhaustive(),
            Binding::Children(items) => f.debug_tuple("Children").field(items).finish(),
        }
    }
}

/// Tag name to binding, rebuilt from scratch on every render
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    entries: HashMap<String, Binding>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Binding> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    /// Store a binding; a later write to the same key replaces it
    pub fn insert(&mut self, key: impl Into<String>, binding: Binding) -> &mut Self {
        self.entries.insert(key.into(), binding);
        self
    }

    /// Substitute `value` as text wherever `[[key]]` appears
    pub fn bind_text(&mut self, key: impl Into<String>, value: impl fmt::Display) -> &mut Self {
        self.insert(key, Binding::Text(value.to_string()))
    }

    /// Keep (`true`) or remove (`false`) the element carrying `[[key]]`
    pub fn bind_visibility(&mut self, key: impl Into<String>, visible: bool) -> &mut Self {
        self.insert(key, Binding::Visibility(visible))
    }

    /// Listen for `event` on the element carrying `[[key]]`.
    ///
    /// The installed listener stops propagation and prevents the default
    /// action before calling `handler` with the owning component.
    pub fn bind_event(
        &mut self,
        key: impl Into<String>,
        event: impl Into<String>,
        handler: impl Fn(&Component) + 'static,
    ) -> &mut Self {
        self.insert(
            key,
            Binding::Event {
                event: event.into(),
                handler: Rc::new(handler),
            },
        )
    }

    /// Compose `items`, in order, where `[[key]]` appears as content
    pub fn bind_children<I, C>(&mut self, key: impl Into<String>, items: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Child>,
    {
        let items = items.into_iter().map(Into::into).collect();
        self.insert(key, Binding::Children(items))
    }

    /// Register a binding by the shape of a data value.
    ///
    /// Booleans become visibility bindings, strings and numbers text
    /// bindings, and arrays children bindings whose string items become text
    /// nodes. Tables and datetimes are ignored on purpose: unknown shapes are
    /// dropped rather than treated as errors. Returns whether a binding was
    /// created.
    pub fn register(&mut self, key: impl Into<String>, value: &Value) -> bool {
        let key = key.into();
        match value {
            Value::Boolean(b) => {
                self.bind_visibility(key, *b);
            }
            Value::String(s) => {
                self.bind_text(key, s);
            }
            Value::Integer(i) => {
                self.bind_text(key, i);
            }
            Value::Float(f) => {
                self.bind_text(key, format_number(*f));
            }
            Value::Array(items) => {
                let children: Vec<Child> = items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(Child::Text(s.clone())),
                        other => {
                            log::debug!("skipping {} item in children of '{}'", other.type_str(), key);
                            None
                        }
                    })
                    .collect();
                self.bind_children(key, children);
            }
            Value::Table(_) | Value::Datetime(_) => {
                log::debug!("ignoring {} value registered as '{}'", value.type_str(), key);
                return false;
            }
        }
        true
    }

    /// Register every entry of a table, see [`Bindings::register`]
    pub fn register_all(&mut self, table: &toml::Table) -> usize {
        table
            .iter()
            .filter(|(key, value)| self.register(key.as_str(), value))
            .count()
    }
}

/// Render a float the way a template author expects to read it
fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let sign = if value > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_binders() {
        let mut bindings = Bindings::new();
        bindings
            .bind_text("label", "Hi")
            .bind_text("count", 3)
            .bind_visibility("shown", false)
            .bind_event("click", "click", |_| {})
            .bind_children("items", ["a", "b"]);

        assert_eq!(bindings.len(), 5);
        assert!(matches!(bindings.get("label"), Some(Binding::Text(t)) if t == "Hi"));
        assert!(matches!(bindings.get("count"), Some(Binding::Text(t)) if t == "3"));
        assert!(matches!(bindings.get("shown"), Some(Binding::Visibility(false))));
        assert!(matches!(bindings.get("click"), Some(Binding::Event { event, .. }) if event == "click"));
        assert!(matches!(bindings.get("items"), Some(Binding::Children(c)) if c.len() == 2));
    }

    #[test]
    fn test_last_write_wins() {
        let mut bindings = Bindings::new();
        bindings.bind_text("x", "first").bind_visibility("x", true);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings.get("x").map(Binding::kind), Some("visibility"));
    }

    #[test]
    fn test_register_dispatches_on_shape() {
        let table: toml::Table = toml::from_str(
            r#"
            title = "Hello"
            count = 7
            ratio = 2.5
            whole = 3.0
            open = true
            tags = ["a", 1, "b"]
            nested = { a = 1 }
            "#,
        )
        .unwrap();

        let mut bindings = Bindings::new();
        assert_eq!(bindings.register_all(&table), 6);

        assert!(matches!(bindings.get("title"), Some(Binding::Text(t)) if t == "Hello"));
        assert!(matches!(bindings.get("count"), Some(Binding::Text(t)) if t == "7"));
        assert!(matches!(bindings.get("ratio"), Some(Binding::Text(t)) if t == "2.5"));
        assert!(matches!(bindings.get("whole"), Some(Binding::Text(t)) if t == "3"));
        assert!(matches!(bindings.get("open"), Some(Binding::Visibility(true))));
        match bindings.get("tags") {
            Some(Binding::Children(items)) => assert_eq!(items.len(), 2),
            other => panic!("Expected children, got {:?}", other),
        }
        assert!(bindings.get("nested").is_none());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(f64::NAN), "NaN");
    }
}
