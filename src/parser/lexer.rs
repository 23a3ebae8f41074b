//! Lexer for the doctodo markup using logos

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Unescape the body of a quoted string literal
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    // Block keywords
    #[token("section")]
    Section,
    #[token("para")]
    Para,
    #[token("list")]
    List,
    #[token("item")]
    Item,
    #[token("literal")]
    Literal,
    #[token("label")]
    Label,

    // Inline keywords
    #[token("em")]
    Em,
    #[token("strong")]
    Strong,
    #[token("code")]
    Code,
    #[token("ref")]
    Ref,
    #[token("as")]
    As,

    // Directive invocation: `@todo`, `@todolist`
    #[regex(r"@[a-zA-Z_][a-zA-Z0-9_-]*", |lex| lex.slice()[1..].to_string())]
    Directive(String),

    // Delimiters
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,

    // Literals - identifiers must come after keywords
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_-]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape(&s[1..s.len()-1])
    })]
    String(String),

    // Comments (skip)
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    #[regex(r"/\*([^*]|\*[^/])*\*/", logos::skip)]
    BlockComment,
}

/// Lex input string into tokens with spans.
///
/// Input logos cannot match comes back as `Err(())` with its span.
pub fn lex(input: &str) -> impl Iterator<Item = (Result<Token, ()>, Span)> + '_ {
    Token::lexer(input).spanned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        lex(input).map(|(t, _)| t.expect("valid token")).collect()
    }

    #[test]
    fn test_block_keywords() {
        let toks = tokens("section para list item literal label");
        assert_eq!(
            toks,
            vec![
                Token::Section,
                Token::Para,
                Token::List,
                Token::Item,
                Token::Literal,
                Token::Label
            ]
        );
    }

    #[test]
    fn test_inline_keywords() {
        let toks = tokens("em strong code ref as");
        assert_eq!(
            toks,
            vec![Token::Em, Token::Strong, Token::Code, Token::Ref, Token::As]
        );
    }

    #[test]
    fn test_directive_names() {
        let toks = tokens("@todo @todolist @my-ext");
        assert_eq!(
            toks,
            vec![
                Token::Directive("todo".to_string()),
                Token::Directive("todolist".to_string()),
                Token::Directive("my-ext".to_string()),
            ]
        );
    }

    #[test]
    fn test_identifiers_with_hyphens() {
        let toks = tokens("fix-x sectioned");
        assert_eq!(
            toks,
            vec![
                Token::Ident("fix-x".to_string()),
                Token::Ident("sectioned".to_string())
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        let toks = tokens(r#""say \"hi\"\n""#);
        assert_eq!(toks, vec![Token::String("say \"hi\"\n".to_string())]);
    }

    #[test]
    fn test_comments_skipped() {
        let toks = tokens("para // comment\n/* block */ \"x\"");
        assert_eq!(toks, vec![Token::Para, Token::String("x".to_string())]);
    }

    #[test]
    fn test_options_block() {
        let toks = tokens(r#"@todo [class: "urgent", name: fix]"#);
        assert_eq!(
            toks,
            vec![
                Token::Directive("todo".to_string()),
                Token::BracketOpen,
                Token::Ident("class".to_string()),
                Token::Colon,
                Token::String("urgent".to_string()),
                Token::Comma,
                Token::Ident("name".to_string()),
                Token::Colon,
                Token::Ident("fix".to_string()),
                Token::BracketClose,
            ]
        );
    }

    #[test]
    fn test_unmatched_input_is_kept() {
        let out: Vec<_> = lex("para \"a\" ; $").collect();
        assert_eq!(out.len(), 4);
        assert_eq!(out[2], (Err(()), 9..10));
        assert_eq!(out[3], (Err(()), 11..12));
    }

    #[test]
    fn test_spans_are_byte_offsets() {
        let spans: Vec<_> = lex("para \"x\"").map(|(_, s)| s).collect();
        assert_eq!(spans, vec![0..4, 5..8]);
    }
}
