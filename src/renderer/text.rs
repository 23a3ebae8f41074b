//! Plain text writer

use crate::builder::OutputFormat;
use crate::config::Config;
use crate::doctree::{Element, NodeKind};

use super::{unknown_node, NodeRegistry, Translator, Visit, WriteError, WriterConfig};

const UNDERLINES: [char; 5] = ['=', '-', '~', '^', '"'];
const ADMONITION_INDENT: usize = 3;

pub struct TextTranslator<'a> {
    docname: &'a str,
    config: &'a Config,
    nodes: &'a NodeRegistry,
    writer: &'a WriterConfig,
    /// Rendered output so far
    pub body: String,
    /// Inline text of the block being built
    pending: String,
    indent: usize,
    saved_indents: Vec<usize>,
    bullet: bool,
    stack: Vec<NodeKind>,
    section_level: usize,
}

impl<'a> TextTranslator<'a> {
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
            pending: String::new(),
            indent: 0,
            saved_indents: Vec::new(),
            bullet: false,
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

    pub fn finish(mut self) -> String {
        self.flush();
        self.body
    }

    /// Add inline text to the current block
    pub fn add_text(&mut self, text: &str) {
        self.pending.push_str(text);
    }

    pub fn visit_admonition(&mut self, _el: &Element) {
        self.flush();
        self.saved_indents.push(self.indent);
    }

    pub fn depart_admonition(&mut self, _el: &Element) {
        self.flush();
        if let Some(indent) = self.saved_indents.pop() {
            self.indent = indent;
        }
    }

    /// Write the pending block, wrapped and indented, followed by a blank line
    fn flush(&mut self) {
        let text = std::mem::take(&mut self.pending);
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return;
        }
        let width = self.writer.text_width.saturating_sub(self.indent).max(20);
        let mut lines: Vec<String> = Vec::new();
        let mut current = String::new();
        for word in words {
            if !current.is_empty() && current.len() + 1 + word.len() > width {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);

        for (i, line) in lines.iter().enumerate() {
            if i == 0 && self.bullet {
                let pad = " ".repeat(self.indent.saturating_sub(2));
                self.body.push_str(&format!("{}* {}\n", pad, line));
            } else {
                self.body
                    .push_str(&format!("{}{}\n", " ".repeat(self.indent), line));
            }
        }
        self.bullet = false;
        self.body.push('\n');
    }

    fn parent(&self) -> Option<&NodeKind> {
        self.stack.last()
    }

    fn visit_builtin(&mut self, el: &Element) {
        match &el.kind {
            NodeKind::Section => {
                self.flush();
                self.section_level += 1;
            }
            NodeKind::Title | NodeKind::Paragraph | NodeKind::BulletList => self.flush(),
            NodeKind::Emphasis => self.add_text("*"),
            NodeKind::Strong => self.add_text("**"),
            NodeKind::Literal => self.add_text("\""),
            NodeKind::ListItem => {
                self.flush();
                self.saved_indents.push(self.indent);
                self.indent += 2;
                self.bullet = true;
            }
            NodeKind::LiteralBlock => self.flush(),
            NodeKind::Admonition => self.visit_admonition(el),
            NodeKind::SystemMessage => {
                self.flush();
                let mut origin = el.source.clone().unwrap_or_default();
                if let Some(line) = el.line {
                    origin.push_str(&format!(", line {}", line));
                }
                self.add_text(&format!(
                    "System Message: {}/{} ({})",
                    el.attr("type").unwrap_or("ERROR"),
                    el.attr("level").unwrap_or("3"),
                    origin
                ));
                self.flush();
            }
            NodeKind::Document
            | NodeKind::Target
            | NodeKind::Reference
            | NodeKind::PendingXref
            | NodeKind::Custom(_) => {}
        }
    }

    fn depart_builtin(&mut self, el: &Element) {
        match &el.kind {
            NodeKind::Document | NodeKind::Paragraph | NodeKind::BulletList => self.flush(),
            NodeKind::Section => {
                self.flush();
                self.section_level -= 1;
            }
            NodeKind::Title => {
                let title = std::mem::take(&mut self.pending).trim().to_string();
                let pad = " ".repeat(self.indent);
                if self.parent() == Some(&NodeKind::Section) {
                    let index = self.section_level.clamp(1, UNDERLINES.len()) - 1;
                    let underline: String = std::iter::repeat(UNDERLINES[index])
                        .take(title.chars().count())
                        .collect();
                    self.body
                        .push_str(&format!("{}{}\n{}{}\n\n", pad, title, pad, underline));
                } else {
                    self.body.push_str(&format!("{}{}:\n", pad, title));
                    self.indent += ADMONITION_INDENT;
                }
            }
            NodeKind::Emphasis => self.add_text("*"),
            NodeKind::Strong => self.add_text("**"),
            NodeKind::Literal => self.add_text("\""),
            NodeKind::ListItem => {
                self.flush();
                if let Some(indent) = self.saved_indents.pop() {
                    self.indent = indent;
                }
            }
            NodeKind::LiteralBlock => {
                let text = std::mem::take(&mut self.pending);
                let pad = " ".repeat(self.indent + 4);
                for line in text.lines() {
                    self.body.push_str(&format!("{}{}\n", pad, line));
                }
                self.body.push('\n');
            }
            NodeKind::Admonition => self.depart_admonition(el),
            NodeKind::SystemMessage
            | NodeKind::Target
            | NodeKind::Reference
            | NodeKind::PendingXref
            | NodeKind::Custom(_) => {}
        }
    }
}

impl Translator for TextTranslator<'_> {
    fn visit(&mut self, element: &mut Element) -> Result<Visit, WriteError> {
        let visit = if let NodeKind::Custom(name) = &element.kind {
            let Some((visit, _)) = self.nodes.get(name).and_then(|h| h.text) else {
                return Err(unknown_node(element, OutputFormat::Text));
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
            let Some((_, depart)) = self.nodes.get(name).and_then(|h| h.text) else {
                return Err(unknown_node(element, OutputFormat::Text));
            };
            depart(self, element);
        } else {
            self.depart_builtin(element);
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        self.add_text(text);
    }
}
