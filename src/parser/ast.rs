//! Abstract Syntax Tree types for the doctodo markup

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Valid identifier (alphanumeric, underscore, hyphen; starts with letter/_)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(pub String);

impl Identifier {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Root AST node - one source document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub blocks: Vec<Spanned<Block>>,
}

/// Block-level construct
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// `section [name] "Title" { ... }`
    Section(SectionDecl),
    /// `para "text" em "x" ...`
    Paragraph(Vec<Spanned<Inline>>),
    /// `list { item { ... } ... }`
    List(Vec<Spanned<Vec<Spanned<Block>>>>),
    /// `literal "text"`
    LiteralBlock(String),
    /// `label name` - explicit link target
    Label(Spanned<Identifier>),
    /// `@name [options] { ... }`
    Directive(DirectiveCall),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionDecl {
    pub name: Option<Spanned<Identifier>>,
    pub title: Spanned<String>,
    pub body: Vec<Spanned<Block>>,
}

/// Inline content of a paragraph
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Emphasis(String),
    Strong(String),
    Code(String),
    /// `ref target [as "text"]`
    Ref {
        target: Identifier,
        text: Option<String>,
    },
}

/// Directive invocation
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveCall {
    pub name: Spanned<String>,
    pub options: Vec<Spanned<DirectiveOption>>,
    /// `None` when no body was written; `Some(vec![])` for an empty `{}`
    pub body: Option<Vec<Spanned<Block>>>,
}

/// `key: value` inside a directive's option block
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveOption {
    pub key: Spanned<Identifier>,
    pub value: Spanned<String>,
}
