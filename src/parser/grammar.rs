//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::parser::ast::*;
use crate::parser::lexer::Token;

/// Parse markup source into an AST
pub fn parse(input: &str) -> Result<Document, Vec<crate::ParseError>> {
    let len = input.len();

    // Split the logos output into tokens and input it could not match
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    for (tok, span) in crate::parser::lexer::lex(input) {
        match tok {
            Ok(tok) => tokens.push((tok, SimpleSpan::from(span))),
            Err(()) => errors.push(crate::ParseError::unexpected_input(&input[span.clone()], span)),
        }
    }

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(tokens.into_iter())
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    match document_parser().parse(token_stream).into_result() {
        Ok(doc) if errors.is_empty() => Ok(doc),
        Ok(_) => Err(errors),
        Err(errs) => {
            errors.extend(errs.into_iter().map(|e| e.into()));
            errors.sort_by_key(|e| e.span().start);
            Err(errors)
        }
    }
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn document_parser<'a, I>() -> impl Parser<'a, I, Document, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    // Basic token parsers
    let identifier = select! {
        Token::Ident(s) => Identifier::new(s),
    }
    .map_with(|id, e| Spanned::new(id, span_range(&e.span())));

    let string_literal = select! {
        Token::String(s) => s,
    }
    .map_with(|s, e| Spanned::new(s, span_range(&e.span())));

    // Inline content: plain strings and the inline keywords
    let inline = choice((
        string_literal.clone().map(|s| Inline::Text(s.node)),
        just(Token::Em)
            .ignore_then(string_literal.clone())
            .map(|s| Inline::Emphasis(s.node)),
        just(Token::Strong)
            .ignore_then(string_literal.clone())
            .map(|s| Inline::Strong(s.node)),
        just(Token::Code)
            .ignore_then(string_literal.clone())
            .map(|s| Inline::Code(s.node)),
        just(Token::Ref)
            .ignore_then(identifier.clone())
            .then(just(Token::As).ignore_then(string_literal.clone()).or_not())
            .map(|(target, text)| Inline::Ref {
                target: target.node,
                text: text.map(|t| t.node),
            }),
    ))
    .map_with(|inline, e| Spanned::new(inline, span_range(&e.span())));

    // Directive options: [key: "value", key: ident]
    let option_value = choice((
        string_literal.clone(),
        identifier
            .clone()
            .map(|id| Spanned::new(id.node.0, id.span)),
    ));

    let option = identifier
        .clone()
        .then_ignore(just(Token::Colon))
        .then(option_value)
        .map_with(|(key, value), e| {
            Spanned::new(DirectiveOption { key, value }, span_range(&e.span()))
        });

    let option_block = option
        .separated_by(just(Token::Comma))
        .allow_trailing()
        .collect::<Vec<_>>()
        .delimited_by(just(Token::BracketOpen), just(Token::BracketClose));

    let directive_name = select! {
        Token::Directive(name) => name,
    }
    .map_with(|name, e| Spanned::new(name, span_range(&e.span())));

    // Recursive block parser
    let block = recursive(|block| {
        let body = block
            .clone()
            .repeated()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::BraceOpen), just(Token::BraceClose));

        let section = just(Token::Section)
            .ignore_then(identifier.clone().or_not())
            .then(string_literal.clone())
            .then(body.clone())
            .map(|((name, title), body)| Block::Section(SectionDecl { name, title, body }));

        let paragraph = just(Token::Para)
            .ignore_then(inline.clone().repeated().at_least(1).collect::<Vec<_>>())
            .map(Block::Paragraph);

        let item = just(Token::Item)
            .ignore_then(body.clone())
            .map_with(|blocks, e| Spanned::new(blocks, span_range(&e.span())));

        let list = just(Token::List)
            .ignore_then(
                item.repeated()
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::BraceOpen), just(Token::BraceClose)),
            )
            .map(Block::List);

        let literal = just(Token::Literal)
            .ignore_then(string_literal.clone())
            .map(|s| Block::LiteralBlock(s.node));

        let label = just(Token::Label)
            .ignore_then(identifier.clone())
            .map(Block::Label);

        // A bare string body is shorthand for a single paragraph
        let shorthand = string_literal.clone().map(|s| {
            let span = s.span.clone();
            vec![Spanned::new(
                Block::Paragraph(vec![Spanned::new(Inline::Text(s.node), span.clone())]),
                span,
            )]
        });

        let directive = directive_name
            .clone()
            .then(option_block.clone().or_not())
            .then(choice((body.clone(), shorthand)).or_not())
            .map(|((name, options), body)| {
                Block::Directive(DirectiveCall {
                    name,
                    options: options.unwrap_or_default(),
                    body,
                })
            });

        choice((section, paragraph, list, literal, label, directive))
            .map_with(|b, e| Spanned::new(b, span_range(&e.span())))
            .boxed()
    });

    // Document is a list of blocks
    block
        .repeated()
        .collect()
        .then_ignore(end())
        .map(|blocks| Document { blocks })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stray_characters_are_errors() {
        let errors = parse("@todo { para \"fix\" ; \"X\" $ }").expect_err("Should fail");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message(), "Unexpected character ';'");
        assert_eq!(errors[0].span(), &(19..20));
        assert_eq!(errors[1].message(), "Unexpected character '$'");
    }

    #[test]
    fn test_stray_character_after_valid_document() {
        let errors = parse("para \"x\" \u{a7}").expect_err("Should fail");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Unexpected character '\u{a7}'");
    }

    #[test]
    fn test_parse_empty_document() {
        let doc = parse("").expect("Should parse");
        assert!(doc.blocks.is_empty());
    }

    #[test]
    fn test_parse_paragraph_inlines() {
        let doc = parse(r#"para "Read " em "this" " and " code "that" ref usage as "here""#)
            .expect("Should parse");
        assert_eq!(doc.blocks.len(), 1);
        match &doc.blocks[0].node {
            Block::Paragraph(inlines) => {
                assert_eq!(inlines.len(), 6);
                assert_eq!(inlines[0].node, Inline::Text("Read ".to_string()));
                assert_eq!(inlines[1].node, Inline::Emphasis("this".to_string()));
                assert_eq!(inlines[3].node, Inline::Code("that".to_string()));
                assert_eq!(
                    inlines[5].node,
                    Inline::Ref {
                        target: Identifier::new("usage"),
                        text: Some("here".to_string())
                    }
                );
            }
            other => panic!("Expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_section_with_name() {
        let doc = parse(r#"section install "Installing" { para "x" }"#).expect("Should parse");
        match &doc.blocks[0].node {
            Block::Section(s) => {
                assert_eq!(s.name.as_ref().unwrap().node.as_str(), "install");
                assert_eq!(s.title.node, "Installing");
                assert_eq!(s.body.len(), 1);
            }
            other => panic!("Expected section, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_directive_with_options_and_body() {
        let doc = parse(r#"@todo [class: "urgent", name: fix-x] { para "Fix X" }"#)
            .expect("Should parse");
        match &doc.blocks[0].node {
            Block::Directive(d) => {
                assert_eq!(d.name.node, "todo");
                assert_eq!(d.options.len(), 2);
                assert_eq!(d.options[0].node.key.node.as_str(), "class");
                assert_eq!(d.options[0].node.value.node, "urgent");
                assert_eq!(d.options[1].node.value.node, "fix-x");
                assert_eq!(d.body.as_ref().unwrap().len(), 1);
            }
            other => panic!("Expected directive, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_directive_shorthand_body() {
        let doc = parse(r#"@todo "fix X""#).expect("Should parse");
        match &doc.blocks[0].node {
            Block::Directive(d) => {
                let body = d.body.as_ref().unwrap();
                assert_eq!(body.len(), 1);
                assert!(matches!(&body[0].node, Block::Paragraph(p) if p.len() == 1));
            }
            other => panic!("Expected directive, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_directive_without_body() {
        let doc = parse("@todolist para \"after\"").expect("Should parse");
        assert_eq!(doc.blocks.len(), 2);
        match &doc.blocks[0].node {
            Block::Directive(d) => {
                assert_eq!(d.name.node, "todolist");
                assert!(d.options.is_empty());
                assert!(d.body.is_none());
            }
            other => panic!("Expected directive, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_directive_empty_body() {
        let doc = parse("@todo {}").expect("Should parse");
        match &doc.blocks[0].node {
            Block::Directive(d) => assert_eq!(d.body, Some(vec![])),
            other => panic!("Expected directive, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_list_and_literal() {
        let doc = parse(r#"list { item { para "a" } item { para "b" literal "c" } }"#)
            .expect("Should parse");
        match &doc.blocks[0].node {
            Block::List(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[1].node.len(), 2);
            }
            other => panic!("Expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_label() {
        let doc = parse("label usage").expect("Should parse");
        assert!(matches!(&doc.blocks[0].node, Block::Label(id) if id.node.as_str() == "usage"));
    }

    #[test]
    fn test_parse_nested_directive_in_section() {
        let input = r#"
            section "Top" {
                @todo { para "inner" }
                @todolist
            }
        "#;
        let doc = parse(input).expect("Should parse");
        match &doc.blocks[0].node {
            Block::Section(s) => assert_eq!(s.body.len(), 2),
            other => panic!("Expected section, got {:?}", other),
        }
    }

    #[test]
    fn test_block_spans_cover_source() {
        let input = "para \"a\"\n@todolist";
        let doc = parse(input).expect("Should parse");
        assert_eq!(doc.blocks[0].span, 0..8);
        assert_eq!(doc.blocks[1].span, 9..18);
    }

    #[test]
    fn test_parse_error_unclosed_brace() {
        let result = parse(r#"section "x" { para "a""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_error_empty_paragraph() {
        let result = parse("para");
        assert!(result.is_err());
    }
}
