//! LaTeX writer

use crate::builder::OutputFormat;
use crate::config::Config;
use crate::doctree::{Element, Node, NodeKind};

use super::{unknown_node, NodeRegistry, Translator, Visit, WriteError, WriterConfig};

const SECTION_COMMANDS: [&str; 5] = [
    "section",
    "subsection",
    "subsubsection",
    "paragraph",
    "subparagraph",
];

/// Escape text for LaTeX special characters
pub fn tex_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\textbackslash{}"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '$' => out.push_str("\\$"),
            '&' => out.push_str("\\&"),
            '#' => out.push_str("\\#"),
            '%' => out.push_str("\\%"),
            '_' => out.push_str("\\_"),
            '^' => out.push_str("\\textasciicircum{}"),
            '~' => out.push_str("\\textasciitilde{}"),
            '<' => out.push_str("\\textless{}"),
            '>' => out.push_str("\\textgreater{}"),
            c => out.push(c),
        }
    }
    out
}

pub struct LatexTranslator<'a> {
    docname: &'a str,
    config: &'a Config,
    nodes: &'a NodeRegistry,
    writer: &'a WriterConfig,
    /// Rendered output so far
    pub body: String,
    stack: Vec<NodeKind>,
    section_level: usize,
    /// Labels to emit after the next section heading
    section_ids: Vec<Vec<String>>,
    in_verbatim: bool,
}

impl<'a> LatexTranslator<'a> {
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
            section_ids: Vec::new(),
            in_verbatim: false,
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

    /// `\label` for `id`, namespaced by the current document
    pub fn hypertarget(&self, id: &str, anchor: bool) -> String {
        format!(
            "{}\\label{{{}}}",
            if anchor { "\\phantomsection" } else { "" },
            idescape(&format!("{}:{}", self.docname, id))
        )
    }

    /// Labels for every id of `el`
    pub fn hypertarget_to(&self, el: &Element) -> String {
        el.ids.iter().map(|id| self.hypertarget(id, false)).collect()
    }

    pub fn visit_admonition(&mut self, el: &mut Element, kind: &str) {
        self.body
            .push_str(&format!("\n\\begin{{sphinxadmonition}}{{{}}}{{", kind));
        let targets = self.hypertarget_to(el);
        self.body.push_str(&targets);
        let title = pop_title(el).unwrap_or_default();
        self.body.push_str(&format!("{}:}}", tex_escape(&title)));
    }

    pub fn depart_admonition(&mut self, _el: &Element) {
        self.body.push_str("\\end{sphinxadmonition}\n");
    }

    fn parent(&self) -> Option<&NodeKind> {
        self.stack.last()
    }

    fn visit_builtin(&mut self, el: &mut Element) {
        if el.is(&NodeKind::Admonition) {
            let kind = el.attr("admonition").unwrap_or("note").to_string();
            self.visit_admonition(el, &kind);
            return;
        }
        match &el.kind {
            NodeKind::Document => {
                if self.writer.standalone {
                    let title = self.writer.title.as_deref().unwrap_or(self.docname);
                    self.body.push_str(&format!(
                        "\\documentclass{{report}}\n\\usepackage{{sphinx}}\n\\title{{{}}}\n\\begin{{document}}\n",
                        tex_escape(title)
                    ));
                }
            }
            NodeKind::Section => {
                self.section_level += 1;
                self.section_ids.push(el.ids.clone());
            }
            NodeKind::Title => {
                if self.parent() == Some(&NodeKind::Section) {
                    let index = self.section_level.clamp(1, SECTION_COMMANDS.len()) - 1;
                    self.body
                        .push_str(&format!("\n\\{}{{", SECTION_COMMANDS[index]));
                } else {
                    self.body.push_str("\\sphinxstylestrong{");
                }
            }
            NodeKind::Paragraph | NodeKind::SystemMessage => self.body.push('\n'),
            NodeKind::Emphasis => self.body.push_str("\\sphinxstyleemphasis{"),
            NodeKind::Strong => self.body.push_str("\\sphinxstylestrong{"),
            NodeKind::Literal => self.body.push_str("\\sphinxcode{\\sphinxupquote{"),
            NodeKind::BulletList => self.body.push_str("\n\\begin{itemize}\n"),
            NodeKind::ListItem => self.body.push_str("\\item {} "),
            NodeKind::LiteralBlock => {
                self.in_verbatim = true;
                self.body.push_str("\n\\begin{sphinxVerbatim}\n");
            }
            NodeKind::Target => {
                for id in &el.ids {
                    let target = self.hypertarget(id, true);
                    self.body.push_str(&target);
                }
            }
            NodeKind::Reference => {
                let id = match (el.attr("refid"), el.attr("refuri")) {
                    (Some(refid), _) => Some(format!("{}:{}", self.docname, refid)),
                    (None, Some(uri)) => uri.strip_prefix('%').map(|uri| match uri.split_once('#') {
                        Some((doc, anchor)) => format!("{}:{}", doc, anchor),
                        None => uri.to_string(),
                    }),
                    (None, None) => None,
                };
                match id {
                    Some(id) => self.body.push_str(&format!("{{\\hyperref[{}]{{", idescape(&id))),
                    None => {
                        let uri = el.attr("refuri").unwrap_or_default();
                        self.body.push_str(&format!("{{\\href{{{}}}{{", uri));
                    }
                }
            }
            NodeKind::Admonition | NodeKind::PendingXref | NodeKind::Custom(_) => {}
        }
    }

    fn depart_builtin(&mut self, el: &Element) {
        match &el.kind {
            NodeKind::Document => {
                if self.writer.standalone {
                    self.body.push_str("\n\\end{document}\n");
                }
            }
            NodeKind::Section => {
                self.section_level -= 1;
                self.section_ids.pop();
            }
            NodeKind::Title => {
                if self.parent() == Some(&NodeKind::Section) {
                    self.body.push_str("}\n");
                    let ids = self.section_ids.last().cloned().unwrap_or_default();
                    for id in ids {
                        let target = self.hypertarget(&id, false);
                        self.body.push_str(&target);
                        self.body.push('\n');
                    }
                } else {
                    self.body.push_str("}\n");
                }
            }
            NodeKind::Paragraph | NodeKind::SystemMessage => self.body.push('\n'),
            NodeKind::Emphasis | NodeKind::Strong => self.body.push('}'),
            NodeKind::Literal => self.body.push_str("}}"),
            NodeKind::BulletList => self.body.push_str("\\end{itemize}\n"),
            NodeKind::ListItem => self.body.push('\n'),
            NodeKind::LiteralBlock => {
                self.in_verbatim = false;
                self.body.push_str("\n\\end{sphinxVerbatim}\n");
            }
            NodeKind::Admonition => self.depart_admonition(el),
            NodeKind::Reference => self.body.push_str("}}"),
            NodeKind::Target | NodeKind::PendingXref | NodeKind::Custom(_) => {}
        }
    }
}

impl Translator for LatexTranslator<'_> {
    fn visit(&mut self, element: &mut Element) -> Result<Visit, WriteError> {
        let visit = if let NodeKind::Custom(name) = &element.kind {
            let Some((visit, _)) = self.nodes.get(name).and_then(|h| h.latex) else {
                return Err(unknown_node(element, OutputFormat::Latex));
            };
            visit(self, element)
        } else {
            if element.is(&NodeKind::SystemMessage) {
                self.body.push_str(&format!(
                    "\n\\sphinxstylestrong{{System Message: {}/{}}}",
                    element.attr("type").unwrap_or("ERROR"),
                    element.attr("level").unwrap_or("3")
                ));
            }
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
            let Some((_, depart)) = self.nodes.get(name).and_then(|h| h.latex) else {
                return Err(unknown_node(element, OutputFormat::Latex));
            };
            depart(self, element);
        } else {
            self.depart_builtin(element);
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if self.in_verbatim {
            self.body.push_str(text);
        } else {
            self.body.push_str(&tex_escape(text));
        }
    }
}

/// Remove the leading title child and return its text
pub fn pop_title(el: &mut Element) -> Option<String> {
    match el.children.first() {
        Some(Node::Element(first)) if first.is(&NodeKind::Title) => {
            let title = el.children.remove(0);
            Some(title.astext())
        }
        _ => None,
    }
}

fn idescape(id: &str) -> String {
    format!("\\detokenize{{{}}}", id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::walk;

    fn render(mut doc: Element) -> String {
        let config = Config::default();
        let nodes = NodeRegistry::new();
        let writer = WriterConfig::default();
        let mut translator = LatexTranslator::new("index", &config, &nodes, &writer);
        walk(&mut translator, &mut doc).unwrap();
        translator.finish()
    }

    #[test]
    fn test_tex_escape() {
        assert_eq!(tex_escape("50% of $x_1"), "50\\% of \\$x\\_1");
        assert_eq!(tex_escape("{a}"), "\\{a\\}");
        assert_eq!(tex_escape("\\"), "\\textbackslash{}");
    }

    #[test]
    fn test_admonition_pops_title() {
        let mut note = Element::new(NodeKind::Admonition)
            .with_attr("admonition", "warning")
            .with_child(Element::with_text(NodeKind::Title, "Warning"))
            .with_child(Element::with_text(NodeKind::Paragraph, "hot"));
        note.ids.push("careful".to_string());
        let doc = Element::new(NodeKind::Document).with_child(note);
        assert_eq!(
            render(doc),
            "\n\\begin{sphinxadmonition}{warning}{\\label{\\detokenize{index:careful}}Warning:}\nhot\n\\end{sphinxadmonition}\n"
        );
    }

    #[test]
    fn test_cross_document_reference() {
        let doc = Element::new(NodeKind::Document).with_child(
            Element::with_text(NodeKind::Reference, "entry").with_attr("refuri", "%a#todo-0"),
        );
        assert_eq!(render(doc), "{\\hyperref[\\detokenize{a:todo-0}]{entry}}");
    }

    #[test]
    fn test_same_document_reference() {
        let doc = Element::new(NodeKind::Document)
            .with_child(Element::with_text(NodeKind::Reference, "entry").with_attr("refid", "x"));
        assert_eq!(render(doc), "{\\hyperref[\\detokenize{index:x}]{entry}}");
    }

    #[test]
    fn test_section_heading_with_label() {
        let mut section = Element::new(NodeKind::Section)
            .with_child(Element::with_text(NodeKind::Title, "Set_up"));
        section.ids.push("setup".to_string());
        let doc = Element::new(NodeKind::Document).with_child(section);
        assert_eq!(
            render(doc),
            "\n\\section{Set\\_up}\n\\label{\\detokenize{index:setup}}\n"
        );
    }

    #[test]
    fn test_verbatim_is_not_escaped() {
        let doc = Element::new(NodeKind::Document)
            .with_child(Element::with_text(NodeKind::LiteralBlock, "a_b % c"));
        assert!(render(doc).contains("\n\\begin{sphinxVerbatim}\na_b % c\n\\end{sphinxVerbatim}\n"));
    }
}
