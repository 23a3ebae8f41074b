//! Texinfo writer

use crate::builder::OutputFormat;
use crate::config::Config;
use crate::doctree::{Element, NodeKind};

use super::latex::pop_title;
use super::{unknown_node, NodeRegistry, Translator, Visit, WriteError, WriterConfig};

/// Escape text for Texinfo: `@`, `{` and `}`
pub fn texinfo_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '@' => out.push_str("@@"),
            '{' => out.push_str("@{"),
            '}' => out.push_str("@}"),
            c => out.push(c),
        }
    }
    out
}

/// Node names may not contain `,:()`
fn escape_id(id: &str) -> String {
    id.chars()
        .map(|c| if ",:()".contains(c) { '-' } else { c })
        .collect()
}

pub struct TexinfoTranslator<'a> {
    docname: &'a str,
    config: &'a Config,
    nodes: &'a NodeRegistry,
    writer: &'a WriterConfig,
    /// Rendered output so far
    pub body: String,
    stack: Vec<NodeKind>,
    section_level: usize,
}

impl<'a> TexinfoTranslator<'a> {
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

    /// Anchor name of `id` in `docname`
    pub fn anchor_name(docname: &str, id: &str) -> String {
        escape_id(&format!("{}:{}", docname, id))
    }

    fn add_anchors(&mut self, el: &Element) {
        for id in &el.ids {
            let anchor = Self::anchor_name(self.docname, id);
            self.body.push_str(&format!("@anchor{{{}}}\n", anchor));
        }
    }

    fn ensure_eol(&mut self) {
        if !self.body.is_empty() && !self.body.ends_with('\n') {
            self.body.push('\n');
        }
    }

    /// Box the element; its leading title becomes the quotation label
    pub fn visit_admonition(&mut self, el: &mut Element) {
        self.add_anchors(el);
        let title = pop_title(el).unwrap_or_default();
        self.body.push_str(&format!(
            "\n@cartouche\n@quotation {}\n",
            texinfo_escape(&title)
        ));
    }

    pub fn depart_admonition(&mut self, _el: &mut Element) {
        self.ensure_eol();
        self.body.push_str("@end quotation\n@end cartouche\n");
    }

    fn parent(&self) -> Option<&NodeKind> {
        self.stack.last()
    }

    /// Anchor a reference points at, if it stays inside the manual
    fn reference_anchor(&self, el: &Element) -> Option<String> {
        if let Some(refid) = el.attr("refid") {
            return Some(Self::anchor_name(self.docname, refid));
        }
        let uri = el.attr("refuri")?.strip_prefix('%')?;
        Some(match uri.split_once('#') {
            Some((doc, id)) => Self::anchor_name(doc, id),
            None => escape_id(uri),
        })
    }

    fn visit_builtin(&mut self, el: &mut Element) -> Visit {
        let kind = el.kind.clone();
        match &kind {
            NodeKind::Document => {
                if self.writer.standalone {
                    let title = self.writer.title.as_deref().unwrap_or(self.docname);
                    self.body.push_str(&format!(
                        "\\input texinfo\n@setfilename {}.info\n@settitle {}\n",
                        self.docname,
                        texinfo_escape(title)
                    ));
                }
            }
            NodeKind::Section => {
                self.section_level += 1;
                self.add_anchors(el);
            }
            NodeKind::Title => {
                if self.parent() == Some(&NodeKind::Section) {
                    let command = match self.section_level {
                        0 | 1 => "@chapter",
                        2 => "@section",
                        3 => "@subsection",
                        _ => "@subsubsection",
                    };
                    self.body.push_str(&format!("\n{} ", command));
                } else {
                    self.body.push_str("\n@strong{");
                }
            }
            NodeKind::Paragraph => {
                self.add_anchors(el);
                self.body.push('\n');
            }
            NodeKind::Emphasis => self.body.push_str("@emph{"),
            NodeKind::Strong => self.body.push_str("@strong{"),
            NodeKind::Literal => self.body.push_str("@code{"),
            NodeKind::BulletList => self.body.push_str("\n@itemize @bullet\n"),
            NodeKind::ListItem => self.body.push_str("@item\n"),
            NodeKind::LiteralBlock => self.body.push_str("\n@example\n"),
            NodeKind::Admonition => self.visit_admonition(el),
            NodeKind::Target => self.add_anchors(el),
            NodeKind::Reference => {
                let name = texinfo_escape(&el.astext());
                match self.reference_anchor(el) {
                    Some(anchor) => self.body.push_str(&format!("@ref{{{},,{}}}", anchor, name)),
                    None => {
                        let uri = el.attr("refuri").unwrap_or_default();
                        self.body
                            .push_str(&format!("@uref{{{},{}}}", texinfo_escape(uri), name));
                    }
                }
                return Visit::SkipNode;
            }
            NodeKind::SystemMessage => {
                self.body.push_str(&format!(
                    "\n@quotation System Message: {}/{}\n",
                    el.attr("type").unwrap_or("ERROR"),
                    el.attr("level").unwrap_or("3")
                ));
            }
            NodeKind::PendingXref | NodeKind::Custom(_) => {}
        }
        Visit::Continue
    }

    fn depart_builtin(&mut self, el: &mut Element) {
        let kind = el.kind.clone();
        match &kind {
            NodeKind::Document => {
                if self.writer.standalone {
                    self.ensure_eol();
                    self.body.push_str("\n@bye\n");
                }
            }
            NodeKind::Section => self.section_level -= 1,
            NodeKind::Title => {
                if self.parent() == Some(&NodeKind::Section) {
                    self.body.push('\n');
                } else {
                    self.body.push_str("}\n");
                }
            }
            NodeKind::Paragraph => self.body.push('\n'),
            NodeKind::Emphasis | NodeKind::Strong | NodeKind::Literal => self.body.push('}'),
            NodeKind::BulletList => self.body.push_str("@end itemize\n"),
            NodeKind::LiteralBlock => {
                self.ensure_eol();
                self.body.push_str("@end example\n");
            }
            NodeKind::Admonition => self.depart_admonition(el),
            NodeKind::SystemMessage => {
                self.ensure_eol();
                self.body.push_str("@end quotation\n");
            }
            NodeKind::ListItem
            | NodeKind::Target
            | NodeKind::Reference
            | NodeKind::PendingXref
            | NodeKind::Custom(_) => {}
        }
    }
}

impl Translator for TexinfoTranslator<'_> {
    fn visit(&mut self, element: &mut Element) -> Result<Visit, WriteError> {
        let visit = if let NodeKind::Custom(name) = &element.kind {
            let Some((visit, _)) = self.nodes.get(name).and_then(|h| h.texinfo) else {
                return Err(unknown_node(element, OutputFormat::Texinfo));
            };
            visit(self, element)
        } else {
            self.visit_builtin(element)
        };
        if visit == Visit::Continue {
            self.stack.push(element.kind.clone());
        }
        Ok(visit)
    }

    fn depart(&mut self, element: &mut Element) -> Result<(), WriteError> {
        self.stack.pop();
        if let NodeKind::Custom(name) = &element.kind {
            let Some((_, depart)) = self.nodes.get(name).and_then(|h| h.texinfo) else {
                return Err(unknown_node(element, OutputFormat::Texinfo));
            };
            depart(self, element);
        } else {
            self.depart_builtin(element);
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        let escaped = texinfo_escape(text);
        self.body.push_str(&escaped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::walk;

    fn render(mut doc: Element, writer: &WriterConfig) -> String {
        let config = Config::default();
        let nodes = NodeRegistry::new();
        let mut translator = TexinfoTranslator::new("guide", &config, &nodes, writer);
        walk(&mut translator, &mut doc).unwrap();
        translator.finish()
    }

    #[test]
    fn test_texinfo_escape() {
        assert_eq!(texinfo_escape("a@b {c}"), "a@@b @{c@}");
    }

    #[test]
    fn test_sections_and_paragraphs() {
        let mut section = Element::new(NodeKind::Section)
            .with_child(Element::with_text(NodeKind::Title, "Options"))
            .with_child(Element::with_text(NodeKind::Paragraph, "Use {x}."));
        section.ids.push("options".to_string());
        let doc = Element::new(NodeKind::Document).with_child(section);
        assert_eq!(
            render(doc, &WriterConfig::default()),
            "@anchor{guide-options}\n\n@chapter Options\n\nUse @{x@}.\n"
        );
    }

    #[test]
    fn test_admonition() {
        let doc = Element::new(NodeKind::Document).with_child(
            Element::new(NodeKind::Admonition)
                .with_child(Element::with_text(NodeKind::Title, "Note"))
                .with_child(Element::with_text(NodeKind::Paragraph, "x")),
        );
        assert_eq!(
            render(doc, &WriterConfig::default()),
            "\n@cartouche\n@quotation Note\n\nx\n@end quotation\n@end cartouche\n"
        );
    }

    #[test]
    fn test_references() {
        let doc = Element::new(NodeKind::Document)
            .with_child(
                Element::with_text(NodeKind::Reference, "entry").with_attr("refuri", "%a#todo-0"),
            )
            .with_child(Element::with_text(NodeKind::Reference, "here").with_attr("refid", "x"))
            .with_child(
                Element::with_text(NodeKind::Reference, "site")
                    .with_attr("refuri", "https://example.org"),
            );
        assert_eq!(
            render(doc, &WriterConfig::default()),
            "@ref{a-todo-0,,entry}@ref{guide-x,,here}@uref{https://example.org,site}"
        );
    }

    #[test]
    fn test_standalone_wrapper() {
        let doc = Element::new(NodeKind::Document)
            .with_child(Element::with_text(NodeKind::Paragraph, "x"));
        let out = render(doc, &WriterConfig::new().with_standalone(true).with_title("Guide"));
        assert!(out.starts_with("\\input texinfo\n@setfilename guide.info\n@settitle Guide\n"));
        assert!(out.ends_with("\nx\n\n@bye\n"));
    }
}
