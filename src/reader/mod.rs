//! Reading one source document into a doctree
//!
//! The markup is parsed into an AST, then converted block by block. Directive
//! invocations are dispatched through the [`DirectiveRegistry`]; anything the
//! reader cannot make sense of becomes a system message in the tree and a
//! [`BuildWarning`], never a failed build.

pub mod directive;

use std::collections::{HashMap, HashSet};

use crate::config::Config;
use crate::diagnostics::{BuildWarning, Location, Severity};
use crate::doctree::{make_id, normalize_name, Element, Node, NodeKind};
use crate::env::Label;
use crate::parser::ast::{Block, Inline, Span, Spanned};
use crate::parser::parse;

pub use directive::{
    parse_options, run_admonition, AdmonitionDirective, Directive, DirectiveOptions,
    DirectiveRegistry, DirectiveSpec, Invocation, OptionKind, OptionSpec, OptionValue,
    ADMONITION_OPTIONS,
};

/// Maps byte offsets to 1-based line numbers
#[derive(Debug, Clone)]
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn line(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset)
    }
}

/// Result of reading one document
#[derive(Debug, Clone)]
pub struct ReadOutput {
    pub doctree: Element,
    /// Explicit targets defined by the document, in definition order
    pub labels: Vec<(String, Label)>,
    pub warnings: Vec<BuildWarning>,
}

/// State shared by everything that converts one document
pub struct ReaderContext<'a> {
    docname: &'a str,
    source: &'a str,
    config: &'a Config,
    directives: &'a DirectiveRegistry,
    lines: LineIndex,
    ids: HashSet<String>,
    auto_ids: HashMap<String, usize>,
    labels: Vec<(String, Label)>,
    warnings: Vec<BuildWarning>,
}

impl<'a> ReaderContext<'a> {
    pub fn new(
        docname: &'a str,
        source: &'a str,
        text: &str,
        config: &'a Config,
        directives: &'a DirectiveRegistry,
    ) -> Self {
        Self {
            docname,
            source,
            config,
            directives,
            lines: LineIndex::new(text),
            ids: HashSet::new(),
            auto_ids: HashMap::new(),
            labels: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn docname(&self) -> &str {
        self.docname
    }

    /// Path of the source file, as shown in diagnostics
    pub fn source(&self) -> &str {
        self.source
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    pub fn line_of(&self, span: &Span) -> usize {
        self.lines.line(span.start)
    }

    pub fn location(&self, line: usize) -> Location {
        Location::new(self.source, Some(line))
    }

    pub fn set_source_info(&self, element: &mut Element, line: usize) {
        element.source = Some(self.source.to_string());
        element.line = Some(line);
    }

    /// Attach a reference name; it becomes a target once noted
    pub fn add_name(&self, element: &mut Element, name: &str) {
        let name = normalize_name(name);
        if !name.is_empty() && !element.names.contains(&name) {
            element.names.push(name);
        }
    }

    /// Give `element` its id: the first usable one derived from its names, else
    /// `<prefix>-N`.
    pub fn set_id(&mut self, element: &mut Element, prefix: &str) -> String {
        if let Some(id) = element.ids.first() {
            return id.clone();
        }
        let derived = element
            .names
            .iter()
            .map(|name| make_id(name))
            .find(|id| !id.is_empty() && !self.ids.contains(id));
        let id = match derived {
            Some(id) => id,
            None => self.auto_id(prefix),
        };
        self.ids.insert(id.clone());
        element.ids.push(id.clone());
        id
    }

    /// Assign an id and register every name of `element` as a link target
    pub fn note_explicit_target(
        &mut self,
        element: &mut Element,
        prefix: &str,
        title: Option<String>,
    ) -> String {
        let id = self.set_id(element, prefix);
        for name in element.names.clone() {
            if self.labels.iter().any(|(existing, _)| *existing == name) {
                let line = element.line.unwrap_or(0);
                self.warn(
                    format!("Duplicate explicit target name: \"{}\".", name),
                    line,
                );
                continue;
            }
            self.labels.push((
                name,
                Label {
                    docname: self.docname.to_string(),
                    id: id.clone(),
                    title: title.clone(),
                },
            ));
        }
        id
    }

    fn auto_id(&mut self, prefix: &str) -> String {
        let prefix = match make_id(prefix) {
            p if p.is_empty() => "id".to_string(),
            p => p,
        };
        let counter = self.auto_ids.entry(prefix.clone()).or_insert(0);
        loop {
            let candidate = format!("{}-{}", prefix, counter);
            *counter += 1;
            if !self.ids.contains(&candidate) {
                return candidate;
            }
        }
    }

    /// Record a diagnostic and return the system message node standing in for it
    pub fn system_message(&mut self, severity: Severity, message: String, line: usize) -> Node {
        let warning = BuildWarning::new(severity, message, Some(self.location(line))).logged();
        let node = self.message_node(&warning, line);
        self.warnings.push(warning);
        node
    }

    /// Error system message for a failed directive invocation
    pub fn directive_error(&mut self, name: &str, message: &str, line: usize) -> Node {
        let message = if message.starts_with("Content block expected") {
            message.to_string()
        } else {
            format!("Error in \"{}\" directive: {}", name, message)
        };
        self.system_message(Severity::Error, message, line)
    }

    /// Record a warning that leaves no trace in the tree
    pub fn warn(&mut self, message: String, line: usize) {
        let warning = BuildWarning::warning(message, Some(self.location(line)));
        self.warnings.push(warning);
    }

    fn message_node(&self, warning: &BuildWarning, line: usize) -> Node {
        let mut element = Element::new(NodeKind::SystemMessage)
            .with_attr("level", warning.severity.level().to_string())
            .with_attr("type", warning.severity.label())
            .with_child(Element::with_text(NodeKind::Paragraph, warning.message.clone()));
        self.set_source_info(&mut element, line);
        element.into()
    }

    /// Convert a sequence of blocks, as for a directive body
    pub fn nested_parse(&mut self, blocks: &[Spanned<Block>]) -> Vec<Node> {
        blocks
            .iter()
            .flat_map(|block| self.convert_block(block))
            .collect()
    }

    fn convert_block(&mut self, block: &Spanned<Block>) -> Vec<Node> {
        let line = self.line_of(&block.span);
        match &block.node {
            Block::Section(decl) => {
                let mut section = Element::new(NodeKind::Section);
                self.set_source_info(&mut section, line);
                section.push(Element::with_text(NodeKind::Title, decl.title.node.clone()));
                match &decl.name {
                    Some(name) => {
                        self.add_name(&mut section, name.node.as_str());
                        self.note_explicit_target(
                            &mut section,
                            "section",
                            Some(decl.title.node.clone()),
                        );
                    }
                    None => {
                        // implicit id from the title, not linkable by name
                        let id = make_id(&decl.title.node);
                        if !id.is_empty() && !self.ids.contains(&id) {
                            self.ids.insert(id.clone());
                            section.ids.push(id);
                        } else {
                            self.set_id(&mut section, "section");
                        }
                    }
                }
                let body = self.nested_parse(&decl.body);
                section.children.extend(body);
                vec![section.into()]
            }
            Block::Paragraph(inlines) => {
                let mut para = Element::new(NodeKind::Paragraph);
                self.set_source_info(&mut para, line);
                para.children = inlines
                    .iter()
                    .map(|inline| self.convert_inline(inline))
                    .collect();
                vec![para.into()]
            }
            Block::List(items) => {
                let mut list = Element::new(NodeKind::BulletList);
                self.set_source_info(&mut list, line);
                for item in items {
                    let mut list_item = Element::new(NodeKind::ListItem);
                    let item_line = self.line_of(&item.span);
                    self.set_source_info(&mut list_item, item_line);
                    list_item.children = self.nested_parse(&item.node);
                    list.push(list_item);
                }
                vec![list.into()]
            }
            Block::LiteralBlock(text) => {
                let mut literal = Element::with_text(NodeKind::LiteralBlock, text.clone());
                self.set_source_info(&mut literal, line);
                vec![literal.into()]
            }
            Block::Label(name) => {
                let mut target = Element::new(NodeKind::Target);
                self.set_source_info(&mut target, line);
                self.add_name(&mut target, name.node.as_str());
                self.note_explicit_target(&mut target, "target", None);
                vec![target.into()]
            }
            Block::Directive(call) => {
                let directives = self.directives;
                let name = call.name.node.as_str();
                let Some(directive) = directives.get(name) else {
                    return vec![self.system_message(
                        Severity::Error,
                        format!("Unknown directive type \"{}\".", name),
                        line,
                    )];
                };
                let spec = directive.spec();
                let options = match parse_options(&call.options, spec.options) {
                    Ok(options) => options,
                    Err(message) => return vec![self.directive_error(name, &message, line)],
                };
                if !spec.has_content && call.body.is_some() {
                    return vec![self.directive_error(name, "no content permitted.", line)];
                }
                let invocation = Invocation {
                    name,
                    options,
                    content: call.body.as_deref(),
                    line,
                };
                tracing::trace!(directive = name, line, "running directive");
                directive.run(&invocation, self)
            }
        }
    }

    fn convert_inline(&mut self, inline: &Spanned<Inline>) -> Node {
        match &inline.node {
            Inline::Text(text) => Node::text(text.clone()),
            Inline::Emphasis(text) => Element::with_text(NodeKind::Emphasis, text.clone()).into(),
            Inline::Strong(text) => Element::with_text(NodeKind::Strong, text.clone()).into(),
            Inline::Code(text) => Element::with_text(NodeKind::Literal, text.clone()).into(),
            Inline::Ref { target, text } => {
                let line = self.line_of(&inline.span);
                let mut xref = Element::with_text(
                    NodeKind::PendingXref,
                    text.clone().unwrap_or_else(|| target.to_string()),
                )
                .with_attr("reftarget", normalize_name(target.as_str()))
                .with_attr("refexplicit", text.is_some().to_string())
                .with_attr("refdoc", self.docname);
                self.set_source_info(&mut xref, line);
                xref.into()
            }
        }
    }
}

/// Read one document.
///
/// A document that fails to parse is still returned, as a tree holding one severe
/// system message per syntax error.
pub fn read_document(
    docname: &str,
    source: &str,
    text: &str,
    config: &Config,
    directives: &DirectiveRegistry,
) -> ReadOutput {
    let mut ctx = ReaderContext::new(docname, source, text, config, directives);
    let mut document = Element::new(NodeKind::Document).with_attr("docname", docname);
    document.source = Some(source.to_string());

    match parse(text) {
        Ok(ast) => {
            document.children = ctx.nested_parse(&ast.blocks);
        }
        Err(errors) => {
            for error in errors {
                tracing::error!("{}", error.format(text, source));
                let line = ctx.line_of(error.span());
                let warning =
                    BuildWarning::new(Severity::Severe, error.message(), Some(ctx.location(line)));
                document.push(ctx.message_node(&warning, line));
                ctx.warnings.push(warning);
            }
        }
    }

    ReadOutput {
        doctree: document,
        labels: ctx.labels,
        warnings: ctx.warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str) -> ReadOutput {
        let mut directives = DirectiveRegistry::new();
        directives.add("note", Box::new(AdmonitionDirective::new("Note")));
        read_document("index", "index.tdoc", text, &Config::default(), &directives)
    }

    #[test]
    fn test_line_index() {
        let index = LineIndex::new("a\nb\n\nc");
        assert_eq!(index.line(0), 1);
        assert_eq!(index.line(2), 2);
        assert_eq!(index.line(4), 3);
        assert_eq!(index.line(5), 4);
    }

    #[test]
    fn test_section_ids() {
        let out = read("section \"Getting Started\" { para \"x\" }\nsection intro \"Intro\" {}");
        let sections = out.doctree.find_all(&NodeKind::Section);
        assert_eq!(sections[0].ids, vec!["getting-started".to_string()]);
        assert_eq!(sections[1].ids, vec!["intro".to_string()]);
        assert_eq!(sections[1].line, Some(2));
        assert_eq!(out.labels.len(), 1);
        assert_eq!(out.labels[0].0, "intro");
        assert_eq!(out.labels[0].1.title.as_deref(), Some("Intro"));
    }

    #[test]
    fn test_label_creates_target() {
        let out = read("label Setup\npara \"x\"");
        let targets = out.doctree.find_all(&NodeKind::Target);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].ids, vec!["setup".to_string()]);
        assert_eq!(out.labels[0].0, "setup");
        assert_eq!(out.labels[0].1.docname, "index");
    }

    #[test]
    fn test_duplicate_label_warns() {
        let out = read("label a\nlabel a");
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].message.contains("Duplicate explicit target name"));
        let targets = out.doctree.find_all(&NodeKind::Target);
        assert_ne!(targets[0].ids, targets[1].ids);
    }

    #[test]
    fn test_ref_becomes_pending_xref() {
        let out = read("para \"see \" ref setup as \"the setup\"");
        let xrefs = out.doctree.find_all(&NodeKind::PendingXref);
        assert_eq!(xrefs.len(), 1);
        assert_eq!(xrefs[0].attr("reftarget"), Some("setup"));
        assert_eq!(xrefs[0].attr("refexplicit"), Some("true"));
        assert_eq!(xrefs[0].astext(), "the setup");
    }

    #[test]
    fn test_unknown_directive_is_system_message() {
        let out = read("@bogus { para \"x\" }");
        let messages = out.doctree.find_all(&NodeKind::SystemMessage);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].attr("type"), Some("ERROR"));
        assert_eq!(messages[0].astext(), "Unknown directive type \"bogus\".");
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_admonition_directive() {
        let out = read("@note [name: careful] { para \"x\" }");
        let notes = out.doctree.find_all(&NodeKind::Admonition);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].classes, vec!["admonition-note".to_string()]);
        assert_eq!(notes[0].ids, vec!["careful".to_string()]);
        assert_eq!(notes[0].children[0].astext(), "Note");
    }

    #[test]
    fn test_admonition_without_content() {
        let out = read("@note");
        let messages = out.doctree.find_all(&NodeKind::SystemMessage);
        assert_eq!(
            messages[0].astext(),
            "Content block expected for the \"note\" directive; none found."
        );
    }

    #[test]
    fn test_parse_error_yields_severe_message() {
        let out = read("para }");
        let messages = out.doctree.find_all(&NodeKind::SystemMessage);
        assert!(!messages.is_empty());
        assert_eq!(messages[0].attr("type"), Some("SEVERE"));
        assert_eq!(out.warnings[0].severity, Severity::Severe);
    }
}
