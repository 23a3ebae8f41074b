//! Document tree shared by the reader, the build environment and the writers
//!
//! A document is a tree of [`Element`]s and text leaves. Extensions add their own
//! element types through [`NodeKind::Custom`] and attach data through the string
//! attribute map.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Kinds of elements the host knows how to read and write
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Document,
    Section,
    Title,
    Paragraph,
    Emphasis,
    Strong,
    Literal,
    BulletList,
    ListItem,
    LiteralBlock,
    /// Generic admonition (`@note`, `@warning`)
    Admonition,
    /// Anchor-only element carrying ids
    Target,
    /// Resolved link: `refid` (same document) or `refuri`
    Reference,
    /// Unresolved cross-reference: `reftarget`, `refexplicit`
    PendingXref,
    /// Diagnostic embedded in the tree: `level`, `type`
    SystemMessage,
    /// Extension-registered element type
    Custom(String),
}

impl NodeKind {
    pub fn custom(name: impl Into<String>) -> Self {
        NodeKind::Custom(name.into())
    }

    /// Short tag name used for auto-generated ids and diagnostics
    pub fn tag(&self) -> &str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Section => "section",
            NodeKind::Title => "title",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Emphasis => "emphasis",
            NodeKind::Strong => "strong",
            NodeKind::Literal => "literal",
            NodeKind::BulletList => "bullet-list",
            NodeKind::ListItem => "list-item",
            NodeKind::LiteralBlock => "literal-block",
            NodeKind::Admonition => "admonition",
            NodeKind::Target => "target",
            NodeKind::Reference => "reference",
            NodeKind::PendingXref => "pending-xref",
            NodeKind::SystemMessage => "system-message",
            NodeKind::Custom(name) => name.as_str(),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A node in the document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn text(s: impl Into<String>) -> Self {
        Node::Text(s.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn astext(&self) -> String {
        match self {
            Node::Element(el) => el.astext(),
            Node::Text(s) => s.clone(),
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

/// An element with identity, classes, attributes and children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub kind: NodeKind,
    pub ids: Vec<String>,
    pub names: Vec<String>,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub source: Option<String>,
    pub line: Option<usize>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            ids: Vec::new(),
            names: Vec::new(),
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            source: None,
            line: None,
            children: Vec::new(),
        }
    }

    /// Element holding a single text child
    pub fn with_text(kind: NodeKind, text: impl Into<String>) -> Self {
        Self::new(kind).with_child(Node::text(text))
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn push(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    pub fn is(&self, kind: &NodeKind) -> bool {
        &self.kind == kind
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|s| s.as_str())
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Concatenated text of all descendants
    pub fn astext(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// All elements of `kind` below (and including) this one, in document order
    pub fn find_all(&self, kind: &NodeKind) -> Vec<&Element> {
        let mut found = Vec::new();
        find_recursive(self, kind, &mut found);
        found
    }

    /// Instantiate a fresh presentational copy.
    ///
    /// The copy is a deep clone with `ids` and `names` cleared on every element, so
    /// it shares no identity-bearing field with the original or with any other copy.
    /// Everything else (kind, classes, attributes, source info, text) is preserved.
    pub fn fresh_copy(&self) -> Element {
        let mut copy = self.clone();
        clear_identity(&mut copy);
        copy
    }
}

fn collect_text(el: &Element, out: &mut String) {
    for child in &el.children {
        match child {
            Node::Text(s) => out.push_str(s),
            Node::Element(inner) => collect_text(inner, out),
        }
    }
}

fn find_recursive<'a>(el: &'a Element, kind: &NodeKind, found: &mut Vec<&'a Element>) {
    if el.is(kind) {
        found.push(el);
    }
    for child in &el.children {
        if let Node::Element(inner) = child {
            find_recursive(inner, kind, found);
        }
    }
}

fn clear_identity(el: &mut Element) {
    el.ids.clear();
    el.names.clear();
    for child in &mut el.children {
        if let Node::Element(inner) = child {
            clear_identity(inner);
        }
    }
}

/// Replace every descendant element of `kind` with the nodes computed by `replace`.
///
/// The root itself is never replaced. Replacement nodes are spliced in place of the
/// original and are not searched again. Returns the number of replaced elements.
pub fn replace_elements<F>(root: &mut Element, kind: &NodeKind, mut replace: F) -> usize
where
    F: FnMut(&Element) -> Vec<Node>,
{
    replace_in(root, kind, &mut replace)
}

fn replace_in<F>(el: &mut Element, kind: &NodeKind, replace: &mut F) -> usize
where
    F: FnMut(&Element) -> Vec<Node>,
{
    let mut count = 0;
    let children = std::mem::take(&mut el.children);
    let mut rebuilt = Vec::with_capacity(children.len());
    for child in children {
        match child {
            Node::Element(inner) if inner.is(kind) => {
                rebuilt.extend(replace(&inner));
                count += 1;
            }
            Node::Element(mut inner) => {
                count += replace_in(&mut inner, kind, replace);
                rebuilt.push(Node::Element(inner));
            }
            text => rebuilt.push(text),
        }
    }
    el.children = rebuilt;
    count
}

/// Normalize a name into an id: lowercase ASCII alphanumerics joined by single hyphens
pub fn make_id(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !id.is_empty() {
                id.push('-');
            }
            pending_hyphen = false;
            id.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    // ids must start with a letter
    let start = id.find(|c: char| c.is_ascii_alphabetic()).unwrap_or(id.len());
    id[start..].to_string()
}

/// Normalize a reference name: lowercase, whitespace collapsed
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
