//! Lexer for HTML fragments using logos
//!
//! Markup is context sensitive: `class="a"` is text between tags but an
//! attribute inside one. The lexer therefore runs in two modes and morphs
//! between them at every `<name` and the matching `>` or `/>`.

use logos::Logos;

use super::entities;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Tokens handed to the fragment grammar
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `<name`, lower-cased
    OpenTag(String),
    /// `</name>`, lower-cased
    CloseTag(String),
    /// `>` closing an open tag
    TagEnd,
    /// `/>` closing an open tag
    SelfClose,
    Equals,
    /// Quoted attribute value, quotes stripped and references decoded
    Quoted(String),
    /// Attribute name or unquoted attribute value
    Word(String),
    /// Stray `/` inside a tag
    Slash,
    Text(String),
    Comment(String),
    /// Input neither mode could make sense of
    Invalid(String),
}

#[derive(Logos, Debug, Clone, PartialEq)]
enum ContentToken {
    #[token("<!--", comment_body)]
    Comment(String),

    #[regex(r"</[A-Za-z][A-Za-z0-9_:.-]*[ \t\r\n\f]*>", close_tag_name)]
    CloseTag(String),

    #[regex(r"<[A-Za-z][A-Za-z0-9_:.-]*", |lex| lex.slice()[1..].to_ascii_lowercase())]
    OpenTag(String),

    #[regex(r"[^<]+", |lex| entities::decode(lex.slice()))]
    #[token("<", |_| String::from("<"))]
    Text(String),
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum TagToken {
    #[token(">")]
    End,

    #[token("/>")]
    SelfClose,

    #[token("=")]
    Equals,

    #[token("/")]
    Slash,

    #[regex(r#""[^"]*""#, quoted_value)]
    #[regex(r"'[^']*'", quoted_value)]
    Quoted(String),

    #[regex(r#"[^ \t\r\n\f"'<>=/]+(/[^ \t\r\n\f"'<>=/]+)*"#, |lex| lex.slice().to_string())]
    Word(String),
}

/// Consume everything up to and including `-->`
fn comment_body(lex: &mut logos::Lexer<ContentToken>) -> Option<String> {
    let rest = lex.remainder();
    let end = rest.find("-->")?;
    let body = rest[..end].to_string();
    lex.bump(end + 3);
    Some(body)
}

fn close_tag_name(lex: &mut logos::Lexer<ContentToken>) -> String {
    let slice = lex.slice();
    slice[2..slice.len() - 1].trim_end().to_ascii_lowercase()
}

fn quoted_value(lex: &mut logos::Lexer<TagToken>) -> String {
    let slice = lex.slice();
    entities::decode(&slice[1..slice.len() - 1])
}

impl From<TagToken> for Token {
    fn from(tok: TagToken) -> Self {
        match tok {
            TagToken::End => Token::TagEnd,
            TagToken::SelfClose => Token::SelfClose,
            TagToken::Equals => Token::Equals,
            TagToken::Slash => Token::Slash,
            TagToken::Quoted(s) => Token::Quoted(s),
            TagToken::Word(s) => Token::Word(s),
        }
    }
}

/// Tokenize a fragment.
///
/// Adjacent text runs are merged so the grammar sees one text token per
/// run of character data.
pub fn lex(input: &str) -> Vec<(Token, Span)> {
    let mut tokens: Vec<(Token, Span)> = Vec::new();
    let mut content = ContentToken::lexer(input);

    loop {
        let Some(result) = content.next() else {
            break;
        };
        let span = content.span();
        match result {
            Ok(ContentToken::OpenTag(name)) => {
                tokens.push((Token::OpenTag(name), span));
                let mut tag = content.morph::<TagToken>();
                while let Some(result) = tag.next() {
                    let span = tag.span();
                    match result {
                        Ok(tok @ (TagToken::End | TagToken::SelfClose)) => {
                            tokens.push((tok.into(), span));
                            break;
                        }
                        Ok(tok) => tokens.push((tok.into(), span)),
                        Err(()) => tokens.push((Token::Invalid(tag.slice().to_string()), span)),
                    }
                }
                content = tag.morph();
            }
            Ok(ContentToken::CloseTag(name)) => tokens.push((Token::CloseTag(name), span)),
            Ok(ContentToken::Comment(body)) => tokens.push((Token::Comment(body), span)),
            Ok(ContentToken::Text(text)) => match tokens.last_mut() {
                Some((Token::Text(prev), prev_span)) if prev_span.end == span.start => {
                    prev.push_str(&text);
                    prev_span.end = span.end;
                }
                _ => tokens.push((Token::Text(text), span)),
            },
            Err(()) => tokens.push((Token::Invalid(content.slice().to_string()), span)),
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        lex(input).into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_element_with_attributes() {
        assert_eq!(
            kinds(r#"<DIV class="a b" hidden data-x='1'>"#),
            vec![
                Token::OpenTag("div".to_string()),
                Token::Word("class".to_string()),
                Token::Equals,
                Token::Quoted("a b".to_string()),
                Token::Word("hidden".to_string()),
                Token::Word("data-x".to_string()),
                Token::Equals,
                Token::Quoted("1".to_string()),
                Token::TagEnd,
            ]
        );
    }

    #[test]
    fn test_text_and_close_tag() {
        assert_eq!(
            kinds("<span>Hi &amp; bye</span >"),
            vec![
                Token::OpenTag("span".to_string()),
                Token::TagEnd,
                Token::Text("Hi & bye".to_string()),
                Token::CloseTag("span".to_string()),
            ]
        );
    }

    #[test]
    fn test_comment() {
        assert_eq!(
            kinds("<ul><!--COMPONENT:items--></ul>"),
            vec![
                Token::OpenTag("ul".to_string()),
                Token::TagEnd,
                Token::Comment("COMPONENT:items".to_string()),
                Token::CloseTag("ul".to_string()),
            ]
        );
    }

    #[test]
    fn test_self_closing_and_trailing_word() {
        assert_eq!(
            kinds("<input disabled/>"),
            vec![
                Token::OpenTag("input".to_string()),
                Token::Word("disabled".to_string()),
                Token::SelfClose,
            ]
        );
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        assert_eq!(kinds("a < b"), vec![Token::Text("a < b".to_string())]);
    }

    #[test]
    fn test_unterminated_comment_is_invalid() {
        let tokens = kinds("<!-- open");
        assert!(matches!(tokens.first(), Some(Token::Invalid(_))));
    }
}
