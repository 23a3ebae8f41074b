//! HTML writer

use crate::builder::OutputFormat;
use crate::config::Config;
use crate::doctree::{Element, NodeKind};

use super::{unknown_node, NodeRegistry, Translator, Visit, WriteError, WriterConfig};

/// Escape text for HTML content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

pub struct HtmlTranslator<'a> {
    docname: &'a str,
    config: &'a Config,
    nodes: &'a NodeRegistry,
    writer: &'a WriterConfig,
    /// Rendered output so far
    pub body: String,
    /// Kinds of the elements currently open, outermost first
    stack: Vec<NodeKind>,
    section_level: usize,
}

impl<'a> HtmlTranslator<'a> {
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

    pub fn visit_admonition(&mut self, el: &Element) {
        let mut classes = vec!["admonition".to_string()];
        if let Some(kind) = el.attr("admonition") {
            classes.push(kind.to_string());
        }
        classes.extend(el.classes.iter().cloned());
        self.body.push_str(&format!(
            "<div{} class=\"{}\">\n",
            id_attr(el),
            escape(&classes.join(" "))
        ));
    }

    pub fn depart_admonition(&mut self, _el: &Element) {
        self.body.push_str("</div>\n");
    }

    fn parent(&self) -> Option<&NodeKind> {
        self.stack.last()
    }

    fn heading_level(&self) -> usize {
        self.section_level.clamp(1, 6)
    }

    fn visit_builtin(&mut self, el: &Element) {
        match &el.kind {
            NodeKind::Document => {
                if self.writer.standalone {
                    let title = self.writer.title.as_deref().unwrap_or(self.docname);
                    self.body.push_str(&format!(
                        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n",
                        escape(title)
                    ));
                }
            }
            NodeKind::Section => {
                self.section_level += 1;
                self.body.push_str(&format!("<section{}>\n", id_attr(el)));
            }
            NodeKind::Title => {
                if self.parent() == Some(&NodeKind::Section) {
                    self.body.push_str(&format!("<h{}>", self.heading_level()));
                } else {
                    self.body.push_str("<p class=\"admonition-title\">");
                }
            }
            NodeKind::Paragraph => {
                self.body
                    .push_str(&format!("<p{}{}>", id_attr(el), class_attr(el)));
            }
            NodeKind::Emphasis => self.body.push_str("<em>"),
            NodeKind::Strong => self.body.push_str("<strong>"),
            NodeKind::Literal => self.body.push_str("<code class=\"literal\">"),
            NodeKind::BulletList => self.body.push_str("<ul>\n"),
            NodeKind::ListItem => self.body.push_str("<li>"),
            NodeKind::LiteralBlock => self.body.push_str("<pre>"),
            NodeKind::Admonition => self.visit_admonition(el),
            NodeKind::Target => {
                for id in &el.ids {
                    self.body
                        .push_str(&format!("<span id=\"{}\"></span>", escape(id)));
                }
            }
            NodeKind::Reference => {
                let href = match (el.attr("refid"), el.attr("refuri")) {
                    (Some(refid), _) => format!("#{}", refid),
                    (None, Some(refuri)) => refuri.to_string(),
                    (None, None) => String::new(),
                };
                self.body.push_str(&format!(
                    "<a class=\"reference internal\" href=\"{}\">",
                    escape(&href)
                ));
            }
            NodeKind::SystemMessage => {
                let mut origin = el.source.clone().unwrap_or_default();
                if let Some(line) = el.line {
                    origin.push_str(&format!(", line {}", line));
                }
                self.body.push_str(&format!(
                    "<div class=\"system-message\">\n<p class=\"system-message-title\">System Message: {}/{} ({})</p>\n",
                    el.attr("type").unwrap_or("ERROR"),
                    el.attr("level").unwrap_or("3"),
                    escape(&origin)
                ));
            }
            NodeKind::PendingXref | NodeKind::Custom(_) => {}
        }
    }

    fn depart_builtin(&mut self, el: &Element) {
        match &el.kind {
            NodeKind::Document => {
                if self.writer.standalone {
                    self.body.push_str("</body>\n</html>\n");
                }
            }
            NodeKind::Section => {
                self.section_level -= 1;
                self.body.push_str("</section>\n");
            }
            NodeKind::Title => {
                if self.parent() == Some(&NodeKind::Section) {
                    self.body.push_str(&format!("</h{}>\n", self.heading_level()));
                } else {
                    self.body.push_str("</p>\n");
                }
            }
            NodeKind::Paragraph => self.body.push_str("</p>\n"),
            NodeKind::Emphasis => self.body.push_str("</em>"),
            NodeKind::Strong => self.body.push_str("</strong>"),
            NodeKind::Literal => self.body.push_str("</code>"),
            NodeKind::BulletList => self.body.push_str("</ul>\n"),
            NodeKind::ListItem => self.body.push_str("</li>\n"),
            NodeKind::LiteralBlock => self.body.push_str("</pre>\n"),
            NodeKind::Admonition => self.depart_admonition(el),
            NodeKind::Reference => self.body.push_str("</a>"),
            NodeKind::SystemMessage => self.body.push_str("</div>\n"),
            NodeKind::Target | NodeKind::PendingXref | NodeKind::Custom(_) => {}
        }
    }
}

impl Translator for HtmlTranslator<'_> {
    fn visit(&mut self, element: &mut Element) -> Result<Visit, WriteError> {
        let visit = if let NodeKind::Custom(name) = &element.kind {
            let Some((visit, _)) = self.nodes.get(name).and_then(|h| h.html) else {
                return Err(unknown_node(element, OutputFormat::Html));
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
            let Some((_, depart)) = self.nodes.get(name).and_then(|h| h.html) else {
                return Err(unknown_node(element, OutputFormat::Html));
            };
            depart(self, element);
        } else {
            self.depart_builtin(element);
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        self.body.push_str(&escape(text));
    }
}

fn id_attr(el: &Element) -> String {
    el.ids
        .first()
        .map(|id| format!(" id=\"{}\"", escape(id)))
        .unwrap_or_default()
}

fn class_attr(el: &Element) -> String {
    if el.classes.is_empty() {
        String::new()
    } else {
        format!(" class=\"{}\"", escape(&el.classes.join(" ")))
    }
}
