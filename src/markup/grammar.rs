//! Fragment grammar using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use super::ast::{is_void, Attribute, Node};
use super::lexer::{lex, Token};
use crate::error::ParseError;

/// Parse an HTML fragment into a list of top-level nodes
pub fn parse_fragment(input: &str) -> Result<Vec<Node>, Vec<ParseError>> {
    let len = input.len();

    let token_iter = lex(input)
        .into_iter()
        .map(|(tok, span)| (tok, span.into()));

    let token_stream = Stream::from_iter(token_iter)
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    fragment_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

fn fragment_parser<'a, I>() -> impl Parser<'a, I, Vec<Node>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let name = select! { Token::Word(w) => w };
    let value = select! {
        Token::Word(w) => w,
        Token::Quoted(q) => q,
    };

    // A stray `/` between attributes is ignored, as browsers do
    let attribute = choice((
        name.then(just(Token::Equals).ignore_then(value).or_not())
            .map(|(name, value)| {
                Some(Attribute::new(
                    name.to_ascii_lowercase(),
                    value.unwrap_or_default(),
                ))
            }),
        just(Token::Slash).to(None),
    ));

    let attributes = attribute
        .repeated()
        .collect::<Vec<_>>()
        .map(|attrs| attrs.into_iter().flatten().collect::<Vec<_>>());

    let node = recursive(|node| {
        let text = select! { Token::Text(t) => Node::Text(t) };
        let comment = select! { Token::Comment(c) => Node::Comment(c) };

        // <br>, <img ...>, <input .../>
        let void_element = select! { Token::OpenTag(name) if is_void(&name) => name }
            .then(attributes.clone())
            .then_ignore(choice((just(Token::TagEnd), just(Token::SelfClose))))
            .map(|(name, attrs)| Node::element(name, attrs, Vec::new()));

        // <widget ... />
        let self_closing = select! { Token::OpenTag(name) => name }
            .then(attributes.clone())
            .then_ignore(just(Token::SelfClose))
            .map(|(name, attrs)| Node::element(name, attrs, Vec::new()));

        // <div ...> children </div>
        let element = select! { Token::OpenTag(name) => name }
            .then(attributes.clone())
            .then_ignore(just(Token::TagEnd))
            .then(node.repeated().collect::<Vec<_>>())
            .then(select! { Token::CloseTag(name) => name }.map_with(|name, e| (name, e.span())))
            .try_map(|(((name, attrs), children), (close, close_span)), _span| {
                if close == name {
                    Ok(Node::element(name, attrs, children))
                } else {
                    Err(Rich::custom(
                        close_span,
                        format!("Mismatched close tag: expected </{}>, found </{}>", name, close),
                    ))
                }
            });

        // Order matters: void and self-closing forms must be tried before
        // the general element, which would otherwise demand a close tag.
        choice((text, comment, void_element, self_closing, element)).boxed()
    });

    node.repeated().collect::<Vec<_>>().then_ignore(end())
}
