//! Placeholder scanning
//!
//! A placeholder is `[[` + tag name + `]]`. The tag name is at least one
//! character, may contain anything except a line break, and ends at the
//! first `]]` (non-greedy), so `[[a]b]]` names the tag `a]b`.

/// A run of template text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text copied through unchanged
    Literal(&'a str),
    /// A placeholder with its tag name and the full `[[name]]` source
    Placeholder { key: &'a str, raw: &'a str },
}

fn is_line_break(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Length of the tag name starting at `rest`, if a closing `]]` follows on
/// the same line
fn tag_len(rest: &str) -> Option<usize> {
    let first = rest.chars().next()?;
    if is_line_break(first) {
        return None;
    }
    let from = first.len_utf8();
    let line_end = rest.find(is_line_break).unwrap_or(rest.len());
    rest[from..line_end].find("]]").map(|i| from + i)
}

/// Split a template into literal text and placeholders
pub fn scan(template: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut pos = 0;

    while let Some(offset) = template[pos..].find("[[") {
        let start = pos + offset;
        let key_start = start + 2;
        match tag_len(&template[key_start..]) {
            Some(len) => {
                if literal_start < start {
                    segments.push(Segment::Literal(&template[literal_start..start]));
                }
                let end = key_start + len + 2;
                segments.push(Segment::Placeholder {
                    key: &template[key_start..key_start + len],
                    raw: &template[start..end],
                });
                pos = end;
                literal_start = end;
            }
            // Not a placeholder here; a later `[` may still open one
            None => pos = start + 1,
        }
    }

    if literal_start < template.len() {
        segments.push(Segment::Literal(&template[literal_start..]));
    }
    segments
}
