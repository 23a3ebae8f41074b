//! Writers turning resolved doctrees into output documents
//!
//! Every format has a translator that walks the tree with visit/depart calls.
//! Built-in node kinds are handled by the translator itself; extension node types
//! are dispatched through the [`NodeRegistry`], which holds one `(visit, depart)`
//! pair per format.

pub mod config;
pub mod html;
pub mod latex;
pub mod man;
pub mod texinfo;
pub mod text;

use std::collections::HashMap;

use thiserror::Error;

use crate::builder::OutputFormat;
use crate::config::Config;
use crate::doctree::{Element, Node};

pub use config::WriterConfig;
pub use html::HtmlTranslator;
pub use latex::{tex_escape, LatexTranslator};
pub use man::ManTranslator;
pub use texinfo::{texinfo_escape, TexinfoTranslator};
pub use text::TextTranslator;

/// Outcome of visiting an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Continue,
    /// Skip the children and the depart call
    SkipNode,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    #[error("unknown node type: {node} (no {format} handler registered)")]
    UnknownNode { node: String, format: OutputFormat },
}

/// Visit/depart callbacks driven by [`walk`]
pub trait Translator {
    fn visit(&mut self, element: &mut Element) -> Result<Visit, WriteError>;
    fn depart(&mut self, element: &mut Element) -> Result<(), WriteError>;
    fn text(&mut self, text: &str);
}

/// Depth-first traversal. A visit may edit the element's children before they
/// are walked.
pub fn walk<T: Translator>(translator: &mut T, element: &mut Element) -> Result<(), WriteError> {
    if translator.visit(element)? == Visit::SkipNode {
        return Ok(());
    }
    for child in element.children.iter_mut() {
        match child {
            Node::Text(text) => translator.text(text),
            Node::Element(inner) => walk(translator, inner)?,
        }
    }
    translator.depart(element)
}

pub type HtmlVisit = fn(&mut HtmlTranslator<'_>, &mut Element) -> Visit;
pub type HtmlDepart = fn(&mut HtmlTranslator<'_>, &mut Element);
pub type LatexVisit = fn(&mut LatexTranslator<'_>, &mut Element) -> Visit;
pub type LatexDepart = fn(&mut LatexTranslator<'_>, &mut Element);
pub type TextVisit = fn(&mut TextTranslator<'_>, &mut Element) -> Visit;
pub type TextDepart = fn(&mut TextTranslator<'_>, &mut Element);
pub type ManVisit = fn(&mut ManTranslator<'_>, &mut Element) -> Visit;
pub type ManDepart = fn(&mut ManTranslator<'_>, &mut Element);
pub type TexinfoVisit = fn(&mut TexinfoTranslator<'_>, &mut Element) -> Visit;
pub type TexinfoDepart = fn(&mut TexinfoTranslator<'_>, &mut Element);

/// Per-format handlers of one extension node type
#[derive(Clone, Copy, Default)]
pub struct NodeHandlers {
    pub html: Option<(HtmlVisit, HtmlDepart)>,
    pub latex: Option<(LatexVisit, LatexDepart)>,
    pub text: Option<(TextVisit, TextDepart)>,
    pub man: Option<(ManVisit, ManDepart)>,
    pub texinfo: Option<(TexinfoVisit, TexinfoDepart)>,
}

impl NodeHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn html(mut self, visit: HtmlVisit, depart: HtmlDepart) -> Self {
        self.html = Some((visit, depart));
        self
    }

    pub fn latex(mut self, visit: LatexVisit, depart: LatexDepart) -> Self {
        self.latex = Some((visit, depart));
        self
    }

    pub fn text(mut self, visit: TextVisit, depart: TextDepart) -> Self {
        self.text = Some((visit, depart));
        self
    }

    pub fn man(mut self, visit: ManVisit, depart: ManDepart) -> Self {
        self.man = Some((visit, depart));
        self
    }

    pub fn texinfo(mut self, visit: TexinfoVisit, depart: TexinfoDepart) -> Self {
        self.texinfo = Some((visit, depart));
        self
    }

    pub fn supports(&self, format: OutputFormat) -> bool {
        match format {
            OutputFormat::Html => self.html.is_some(),
            OutputFormat::Latex => self.latex.is_some(),
            OutputFormat::Text => self.text.is_some(),
            OutputFormat::Man => self.man.is_some(),
            OutputFormat::Texinfo => self.texinfo.is_some(),
        }
    }
}

/// Extension node types and how each format renders them
#[derive(Default)]
pub struct NodeRegistry {
    nodes: HashMap<String, NodeHandlers>,
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.nodes.keys().collect();
        names.sort();
        f.debug_list().entries(names).finish()
    }
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node type; returns true when it replaced an earlier registration
    pub fn add(&mut self, name: &str, handlers: NodeHandlers) -> bool {
        self.nodes.insert(name.to_string(), handlers).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&NodeHandlers> {
        self.nodes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }
}

pub(crate) fn unknown_node(element: &Element, format: OutputFormat) -> WriteError {
    WriteError::UnknownNode {
        node: element.kind.tag().to_string(),
        format,
    }
}

/// Render a resolved doctree in `format`
pub fn translate(
    format: OutputFormat,
    doctree: &mut Element,
    docname: &str,
    config: &Config,
    nodes: &NodeRegistry,
    writer: &WriterConfig,
) -> Result<String, WriteError> {
    tracing::debug!(docname, format = %format, "writing document");
    match format {
        OutputFormat::Html => {
            let mut translator = HtmlTranslator::new(docname, config, nodes, writer);
            walk(&mut translator, doctree)?;
            Ok(translator.finish())
        }
        OutputFormat::Latex => {
            let mut translator = LatexTranslator::new(docname, config, nodes, writer);
            walk(&mut translator, doctree)?;
            Ok(translator.finish())
        }
        OutputFormat::Text => {
            let mut translator = TextTranslator::new(docname, config, nodes, writer);
            walk(&mut translator, doctree)?;
            Ok(translator.finish())
        }
        OutputFormat::Man => {
            let mut translator = ManTranslator::new(docname, config, nodes, writer);
            walk(&mut translator, doctree)?;
            Ok(translator.finish())
        }
        OutputFormat::Texinfo => {
            let mut translator = TexinfoTranslator::new(docname, config, nodes, writer);
            walk(&mut translator, doctree)?;
            Ok(translator.finish())
        }
    }
}
