//! Directive registry, option handling and the generic admonition base

use std::collections::{BTreeMap, HashMap};

use crate::doctree::{make_id, Element, Node, NodeKind};
use crate::parser::ast::{Block, DirectiveOption, Spanned};

use super::ReaderContext;

/// How an option value is converted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Kept as written
    Unchanged,
    /// Whitespace-separated class names, each normalized with `make_id`
    ClassList,
}

/// A converted option value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Text(String),
    Classes(Vec<String>),
}

/// Options accepted by a directive, by name
pub type OptionSpec = &'static [(&'static str, OptionKind)];

/// Options shared by every admonition-like directive
pub const ADMONITION_OPTIONS: OptionSpec = &[
    ("class", OptionKind::ClassList),
    ("name", OptionKind::Unchanged),
];

/// Static description of a directive's arguments
#[derive(Debug, Clone, Copy)]
pub struct DirectiveSpec {
    pub has_content: bool,
    pub options: OptionSpec,
}

/// Validated options of one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveOptions(BTreeMap<String, OptionValue>);

impl DirectiveOptions {
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(OptionValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn classes(&self, key: &str) -> Option<&[String]> {
        match self.0.get(key) {
            Some(OptionValue::Classes(c)) => Some(c.as_slice()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One directive invocation, after option validation
#[derive(Debug)]
pub struct Invocation<'a> {
    pub name: &'a str,
    pub options: DirectiveOptions,
    /// Raw content blocks; `None` when the invocation had no body
    pub content: Option<&'a [Spanned<Block>]>,
    /// 1-based line of the invocation
    pub line: usize,
}

/// A block directive, dispatched by name from the markup
pub trait Directive: Send + Sync {
    fn spec(&self) -> DirectiveSpec;

    /// Produce the nodes that replace the invocation
    fn run(&self, invocation: &Invocation<'_>, ctx: &mut ReaderContext<'_>) -> Vec<Node>;
}

/// Directives known to the reader
#[derive(Default)]
pub struct DirectiveRegistry {
    directives: HashMap<String, Box<dyn Directive>>,
}

impl DirectiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a directive, replacing any previous one with the same name
    pub fn add(&mut self, name: &str, directive: Box<dyn Directive>) -> bool {
        self.directives.insert(name.to_string(), directive).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&dyn Directive> {
        self.directives.get(name).map(|d| d.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.directives.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.directives.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for DirectiveRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Convert raw options according to `spec`. The error is the message for the
/// system message that replaces the invocation.
pub fn parse_options(
    raw: &[Spanned<DirectiveOption>],
    spec: OptionSpec,
) -> Result<DirectiveOptions, String> {
    let mut options = BTreeMap::new();
    for opt in raw {
        let key = opt.node.key.node.as_str();
        let value = opt.node.value.node.as_str();
        let kind = spec
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| format!("unknown option: \"{}\".", key))?;
        if options.contains_key(key) {
            return Err(format!("duplicate option \"{}\".", key));
        }
        let converted = match kind {
            OptionKind::Unchanged => OptionValue::Text(value.trim().to_string()),
            OptionKind::ClassList => {
                let classes: Vec<String> = value
                    .split_whitespace()
                    .map(make_id)
                    .filter(|c| !c.is_empty())
                    .collect();
                if classes.is_empty() {
                    return Err(format!(
                        "invalid option value for \"{}\": cannot make \"{}\" into a class name.",
                        key, value
                    ));
                }
                OptionValue::Classes(classes)
            }
        };
        options.insert(key.to_string(), converted);
    }
    Ok(DirectiveOptions(options))
}

/// Generic block-admonition parsing shared by admonition-like directives.
///
/// Builds an element of `kind` carrying the `class` option (or `default_class`)
/// and the `name` option, with the content nested-parsed into it. A structural
/// problem yields the system message that must be emitted in place of the
/// element.
pub fn run_admonition(
    invocation: &Invocation<'_>,
    ctx: &mut ReaderContext<'_>,
    kind: NodeKind,
    default_class: &str,
) -> Result<Element, Node> {
    let content = match invocation.content {
        Some(blocks) if !blocks.is_empty() => blocks,
        _ => {
            return Err(ctx.directive_error(
                invocation.name,
                &format!(
                    "Content block expected for the \"{}\" directive; none found.",
                    invocation.name
                ),
                invocation.line,
            ))
        }
    };

    let mut element = Element::new(kind);
    match invocation.options.classes("class") {
        Some(classes) => element.classes.extend(classes.iter().cloned()),
        None => element.classes.push(default_class.to_string()),
    }
    if let Some(name) = invocation.options.text("name") {
        ctx.add_name(&mut element, name);
    }
    ctx.set_source_info(&mut element, invocation.line);
    element.children = ctx.nested_parse(content);
    Ok(element)
}

/// Host admonitions (`@note`, `@warning`) with a fixed title
pub struct AdmonitionDirective {
    title: &'static str,
}

impl AdmonitionDirective {
    pub fn new(title: &'static str) -> Self {
        Self { title }
    }
}

impl Directive for AdmonitionDirective {
    fn spec(&self) -> DirectiveSpec {
        DirectiveSpec {
            has_content: true,
            options: ADMONITION_OPTIONS,
        }
    }

    fn run(&self, invocation: &Invocation<'_>, ctx: &mut ReaderContext<'_>) -> Vec<Node> {
        let default_class = format!("admonition-{}", make_id(invocation.name));
        match run_admonition(invocation, ctx, NodeKind::Admonition, &default_class) {
            Err(message) => vec![message],
            Ok(mut element) => {
                element
                    .children
                    .insert(0, Element::with_text(NodeKind::Title, self.title).into());
                element.set_attr("admonition", invocation.name);
                if !element.names.is_empty() {
                    ctx.note_explicit_target(&mut element, invocation.name, None);
                }
                vec![element.into()]
            }
        }
    }
}
