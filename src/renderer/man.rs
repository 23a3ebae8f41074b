//! Manual page (troff) writer

use crate::builder::OutputFormat;
use crate::config::Config;
use crate::doctree::{Element, NodeKind};

use super::{unknown_node, NodeRegistry, Translator, Visit, WriteError, WriterConfig};

/// Escape text for troff: backslashes, hyphens and control characters at line start
pub fn man_escape(text: &str, at_line_start: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut line_start = at_line_start;
    for ch in text.chars() {
        if line_start && (ch == '.' || ch == '\'') {
            out.push_str("\\&");
        }
        match ch {
            '\\' => out.push_str("\\e"),
            '-' => out.push_str("\\-"),
            c => out.push(c),
        }
        line_start = ch == '\n';
    }
    out
}

pub struct ManTranslator<'a> {
    docname: &'a str,
    config: &'a Config,
    nodes: &'a NodeRegistry,
    writer: &'a WriterConfig,
    /// Rendered output so far
    pub body: String,
    stack: Vec<NodeKind>,
    section_level: usize,
}

impl<'a> ManTranslator<'a> {
    pub fn new(
        docname: &'a str,
        config: &'a Config,
        nodes: &'a NodeRegistry,
        writer: &'a WriterConfig,
    ) -> Self {
        Self {
            docname,
            config,
            nodes,
            writer,
            body: String::new(),
            stack: Vec::new(),
            section_level: 0,
        }
    }

    pub fn docname(&self) -> &str {
        self.docname
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    pub fn finish(self) -> String {
        self.body
    }

    pub fn visit_admonition(&mut self, _el: &Element) {
        self.body.push_str(".sp\n.RS 4\n");
    }

    pub fn depart_admonition(&mut self, _el: &Element) {
        self.body.push_str(".RE\n");
    }

    fn parent(&self) -> Option<&NodeKind> {
        self.stack.last()
    }

    fn visit_builtin(&mut self, el: &Element) {
        match &el.kind {
            NodeKind::Document => {
                if self.writer.standalone {
                    let title = self.writer.title.as_deref().unwrap_or(self.docname);
                    self.body.push_str(&format!(
                        ".TH \"{}\" \"1\"\n",
                        man_escape(&title.to_uppercase(), false)
                    ));
                }
            }
            NodeKind::Section => self.section_level += 1,
            NodeKind::Title => {
                if self.parent() == Some(&NodeKind::Section) {
                    if self.section_level <= 1 {
                        self.body.push_str(".SH ");
                    } else {
                        self.body.push_str(".SS ");
                    }
                } else {
                    self.body.push_str(".sp\n\\fB");
                }
            }
            NodeKind::Paragraph => self.body.push_str(".sp\n"),
            NodeKind::Emphasis => self.body.push_str("\\fI"),
            NodeKind::Strong | NodeKind::Literal => self.body.push_str("\\fB"),
            NodeKind::ListItem => self.body.push_str(".IP \\(bu 2\n"),
            NodeKind::LiteralBlock => self.body.push_str(".sp\n.nf\n.ft C\n"),
            NodeKind::Admonition => self.visit_admonition(el),
            NodeKind::SystemMessage => {
                self.body.push_str(&format!(
                    ".sp\n\\fBSystem Message: {}/{}\\fP\n",
                    el.attr("type").unwrap_or("ERROR"),
                    el.attr("level").unwrap_or("3")
                ));
            }
            NodeKind::BulletList
            | NodeKind::Target
            | NodeKind::Reference
            | NodeKind::PendingXref
            | NodeKind::Custom(_) => {}
        }
    }

    fn depart_builtin(&mut self, el: &Element) {
        match &el.kind {
            NodeKind::Section => self.section_level -= 1,
            NodeKind::Title => {
                if self.parent() == Some(&NodeKind::Section) {
                    self.body.push('\n');
                } else {
                    self.body.push_str(":\\fP\n");
                }
            }
            NodeKind::Paragraph => self.body.push('\n'),
            NodeKind::Emphasis | NodeKind::Strong | NodeKind::Literal => {
                self.body.push_str("\\fP")
            }
            NodeKind::LiteralBlock => self.body.push_str("\n.ft P\n.fi\n"),
            NodeKind::Admonition => self.depart_admonition(el),
            NodeKind::Document
            | NodeKind::BulletList
            | NodeKind::ListItem
            | NodeKind::Target
            | NodeKind::Reference
            | NodeKind::PendingXref
            | NodeKind::SystemMessage
            | NodeKind::Custom(_) => {}
        }
    }
}

impl Translator for ManTranslator<'_> {
    fn visit(&mut self, element: &mut Element) -> Result<Visit, WriteError> {
        let visit = if let NodeKind::Custom(name) = &element.kind {
            let Some((visit, _)) = self.nodes.get(name).and_then(|h| h.man) else {
                return Err(unknown_node(element, OutputFormat::Man));
            };
            visit(self, element)
        } else {
            self.visit_builtin(element);
            Visit::Continue
        };
        if visit == Visit::Continue {
            self.stack.push(element.kind.clone());
        }
        Ok(visit)
    }

    fn depart(&mut self, element: &mut Element) -> Result<(), WriteError> {
        self.stack.pop();
        if let NodeKind::Custom(name) = &element.kind {
            let Some((_, depart)) = self.nodes.get(name).and_then(|h| h.man) else {
                return Err(unknown_node(element, OutputFormat::Man));
            };
            depart(self, element);
        } else {
            self.depart_builtin(element);
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        let at_line_start = self.body.is_empty() || self.body.ends_with('\n');
        let escaped = man_escape(text, at_line_start);
        self.body.push_str(&escaped);
    }
}
