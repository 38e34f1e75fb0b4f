//! Syntax tree for parsed HTML fragments

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// HTML elements that never have content or a close tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Check whether a (lower-cased) tag name is a void element
pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// A single `name="value"` pair on an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A node in a parsed fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element {
        name: String,
        attributes: Vec<Attribute>,
        children: Vec<Node>,
    },
    Text(String),
    Comment(String),
}

impl Node {
    /// Build an element, dropping repeated attributes.
    ///
    /// The first occurrence of an attribute name wins, as in HTML.
    pub fn element(name: impl Into<String>, attributes: Vec<Attribute>, children: Vec<Node>) -> Self {
        let mut unique: Vec<Attribute> = Vec::with_capacity(attributes.len());
        for attr in attributes {
            if !unique.iter().any(|a| a.name == attr.name) {
                unique.push(attr);
            }
        }
        Node::Element {
            name: name.into(),
            attributes: unique,
            children,
        }
    }

    /// Tag name for elements, `None` for text and comments
    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Look up an attribute value on an element
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match self {
            Node::Element { attributes, .. } => attributes
                .iter()
                .find(|a| a.name == name)
                .map(|a| a.value.as_str()),
            _ => None,
        }
    }

    /// Child nodes (empty for text and comments)
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element { children, .. } => children,
            _ => &[],
        }
    }
}
