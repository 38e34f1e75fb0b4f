//! Two-pass template compilation
//!
//! The same `[[tag]]` syntax marks both attribute positions and content
//! positions; what a placeholder turns into depends on its binding:
//!
//! | Binding    | Attribute pass        | Content pass              |
//! |------------|-----------------------|---------------------------|
//! | Visibility | `data-vis="tag"`      |                           |
//! | Event      | `data-on="tag ..."`   |                           |
//! | Text       | kept                  | the text                  |
//! | Children   | kept                  | `<!--COMPONENT:tag-->`    |
//! | (none)     | kept                  | removed                   |
//!
//! Visibility and event placeholders inside a quoted attribute value are
//! dropped. Marker names come from [`RenderConfig`].

use std::collections::{HashMap, HashSet};

use super::scanner::{scan, Segment};
use crate::component::{Binding, Bindings};
use crate::config::RenderConfig;
use crate::markup::entities;

/// Where the scanner is relative to markup structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Content,
    Tag,
    Quoted(char),
}

/// Where a placeholder sits relative to markup structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Content,
    /// Between the attributes of the numbered open tag
    Tag(usize),
    /// Inside a quoted attribute value
    Value,
}

/// For each segment, where it sits. Literals are always `Content`.
///
/// Tags are numbered in order of appearance.
fn locate(segments: &[Segment<'_>]) -> Vec<Position> {
    let mut context = Context::Content;
    let mut next_tag = 0;
    let mut current_tag = 0;
    let mut out = Vec::with_capacity(segments.len());

    for segment in segments {
        match segment {
            Segment::Placeholder { .. } => {
                out.push(match context {
                    Context::Content => Position::Content,
                    Context::Tag => Position::Tag(current_tag),
                    Context::Quoted(_) => Position::Value,
                });
            }
            Segment::Literal(text) => {
                out.push(Position::Content);
                let mut chars = text.chars().peekable();
                while let Some(c) = chars.next() {
                    context = match (context, c) {
                        (Context::Content, '<')
                            if chars.peek().is_some_and(|n| n.is_ascii_alphabetic()) =>
                        {
                            current_tag = next_tag;
                            next_tag += 1;
                            Context::Tag
                        }
                        (Context::Tag, '"' | '\'') => Context::Quoted(c),
                        (Context::Tag, '>') => Context::Content,
                        (Context::Quoted(q), c) if c == q => Context::Tag,
                        (other, _) => other,
                    };
                }
            }
        }
    }
    out
}

/// First pass: turn visibility and event placeholders into marker attributes.
///
/// All event placeholders inside one tag collapse into a single marker
/// attribute listing their tags, space separated. Everything else is
/// copied through for the content pass.
pub fn attribute_pass(template: &str, bindings: &Bindings, config: &RenderConfig) -> String {
    let segments = scan(template);
    let positions = locate(&segments);

    let mut events_by_tag: HashMap<usize, Vec<&str>> = HashMap::new();
    for (segment, position) in segments.iter().zip(&positions) {
        if let (Segment::Placeholder { key, .. }, Position::Tag(tag)) = (segment, position) {
            if matches!(bindings.get(key), Some(Binding::Event { .. })) {
                let keys = events_by_tag.entry(*tag).or_default();
                if !keys.contains(key) {
                    keys.push(*key);
                }
            }
        }
    }

    let mut emitted: HashSet<usize> = HashSet::new();
    let mut out = String::with_capacity(template.len());
    for (segment, position) in segments.iter().zip(&positions) {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Placeholder { key, raw } => match (bindings.get(key), position) {
                // no marker can live inside a quoted value
                (Some(Binding::Visibility(_) | Binding::Event { .. }), Position::Value) => {
                    log::debug!("dropping '{}' placed inside an attribute value", key);
                }
                (Some(Binding::Visibility(_)), _) => {
                    push_marker(&mut out, &config.visibility_attribute, key);
                }
                (Some(Binding::Event { .. }), Position::Tag(tag)) => {
                    if emitted.insert(*tag) {
                        let keys = events_by_tag
                            .get(tag)
                            .map(|keys| keys.join(" "))
                            .unwrap_or_default();
                        push_marker(&mut out, &config.event_attribute, &keys);
                    }
                }
                (Some(Binding::Event { .. }), _) => {
                    push_marker(&mut out, &config.event_attribute, key)
                }
                _ => out.push_str(raw),
            },
        }
    }
    out
}

fn push_marker(out: &mut String, attribute: &str, value: &str) {
    out.push_str(attribute);
    out.push_str("=\"");
    out.push_str(&entities::escape_attribute(value));
    out.push('"');
}

/// Second pass: substitute text, mark composition points, drop the rest
pub fn content_pass(template: &str, bindings: &Bindings, config: &RenderConfig) -> String {
    let mut out = String::with_capacity(template.len());
    for segment in scan(template) {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Placeholder { key, .. } => match bindings.get(key) {
                Some(Binding::Text(value)) => {
                    if config.escape_text {
                        out.push_str(&entities::escape_text(value));
                    } else {
                        out.push_str(value);
                    }
                }
                Some(Binding::Children(_)) => {
                    out.push_str("<!--");
                    out.push_str(&config.component_comment_prefix);
                    out.push_str(key);
                    out.push_str("-->");
                }
                Some(_) => {}
                None => log::trace!("no binding for placeholder '{}', removing it", key),
            },
        }
    }
    out
}

/// Run both passes over a template
pub fn compile(template: &str, bindings: &Bindings, config: &RenderConfig) -> String {
    let with_markers = attribute_pass(template, bindings, config);
    content_pass(&with_markers, bindings, config)
}
