//! The build environment: every document read so far, the link targets they
//! define and the domains extensions keep per-build data in.

use std::any::Any;
use std::collections::HashMap;

use crate::builder::{NoUri, OutputFormat};
use crate::config::Config;
use crate::diagnostics::{BuildWarning, Location};
use crate::doctree::{replace_elements, Element, Node, NodeKind};
use crate::events::{EventBus, EventError};
use crate::reader::ReadOutput;

/// An explicit link target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub docname: String,
    pub id: String,
    /// Text used for references that do not give their own
    pub title: Option<String>,
}

/// What a domain sees while a freshly read document is processed
pub struct ProcessContext<'a> {
    pub config: &'a Config,
    pub events: &'a EventBus,
    pub warnings: &'a mut Vec<BuildWarning>,
}

/// Per-build data owned by an extension, partitioned by document.
///
/// The environment calls [`Domain::clear_doc`] before a document is re-read and
/// [`Domain::process_doc`] once it has been read. Documents read by parallel
/// workers are collected into [`Domain::fresh`] instances and folded back with
/// [`Domain::merge_domaindata`].
pub trait Domain: Send + Sync {
    fn name(&self) -> &'static str;

    /// An empty instance of the same domain
    fn fresh(&self) -> Box<dyn Domain>;

    /// Forget everything recorded for `docname`
    fn clear_doc(&mut self, docname: &str);

    /// Take over the data `other` holds for `docnames`
    fn merge_domaindata(&mut self, docnames: &[String], other: &dyn Domain);

    /// Record the data of a freshly read document
    fn process_doc(
        &mut self,
        ctx: &mut ProcessContext<'_>,
        docname: &str,
        document: &Element,
    ) -> Result<(), EventError>;

    fn as_any(&self) -> &dyn Any;
}

/// A document read away from the environment, ready to be merged
pub struct DocumentRead {
    pub docname: String,
    pub path: String,
    pub output: ReadOutput,
    pub domains: Vec<Box<dyn Domain>>,
}

#[derive(Default)]
pub struct BuildEnvironment {
    /// Documents in processing order
    docnames: Vec<String>,
    doctrees: HashMap<String, Element>,
    doc_paths: HashMap<String, String>,
    labels: HashMap<String, Label>,
    domains: Vec<Box<dyn Domain>>,
}

impl std::fmt::Debug for BuildEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildEnvironment")
            .field("docnames", &self.docnames)
            .field("labels", &self.labels.len())
            .field(
                "domains",
                &self.domains.iter().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl BuildEnvironment {
    pub fn new(domains: Vec<Box<dyn Domain>>) -> Self {
        Self {
            domains,
            ..Self::default()
        }
    }

    pub fn docnames(&self) -> &[String] {
        &self.docnames
    }

    pub fn doctree(&self, docname: &str) -> Option<&Element> {
        self.doctrees.get(docname)
    }

    /// Source path a document was read from
    pub fn doc2path(&self, docname: &str) -> Option<&str> {
        self.doc_paths.get(docname).map(|p| p.as_str())
    }

    pub fn label(&self, name: &str) -> Option<&Label> {
        self.labels.get(name)
    }

    /// The registered domain of type `T`
    pub fn domain<T: Domain + 'static>(&self) -> Option<&T> {
        self.domains
            .iter()
            .find_map(|d| d.as_any().downcast_ref::<T>())
    }

    /// Empty instances of every registered domain, for a parallel reader
    pub fn fresh_domains(&self) -> Vec<Box<dyn Domain>> {
        self.domains.iter().map(|d| d.fresh()).collect()
    }

    /// Forget a document and everything recorded for it
    pub fn clear_doc(&mut self, docname: &str) {
        self.docnames.retain(|d| d != docname);
        self.doctrees.remove(docname);
        self.doc_paths.remove(docname);
        self.labels.retain(|_, label| label.docname != docname);
        for domain in &mut self.domains {
            domain.clear_doc(docname);
        }
    }

    /// Store a document read on this thread, replacing any previous version.
    /// Domains still need [`BuildEnvironment::process_doc`].
    pub fn add_document(
        &mut self,
        docname: &str,
        path: &str,
        output: ReadOutput,
        warnings: &mut Vec<BuildWarning>,
    ) {
        self.clear_doc(docname);
        self.docnames.push(docname.to_string());
        self.doc_paths.insert(docname.to_string(), path.to_string());
        self.add_labels(path, output.labels, warnings);
        self.doctrees.insert(docname.to_string(), output.doctree);
        warnings.extend(output.warnings);
    }

    /// Let every domain record the data of a stored document
    pub fn process_doc(
        &mut self,
        ctx: &mut ProcessContext<'_>,
        docname: &str,
    ) -> Result<(), EventError> {
        let Some(doctree) = self.doctrees.get(docname) else {
            return Ok(());
        };
        for domain in &mut self.domains {
            domain.process_doc(ctx, docname, doctree)?;
        }
        Ok(())
    }

    /// Fold in a document read (and processed) by a parallel worker
    pub fn merge_read(&mut self, read: DocumentRead, warnings: &mut Vec<BuildWarning>) {
        let DocumentRead {
            docname,
            path,
            output,
            domains,
        } = read;
        self.add_document(&docname, &path, output, warnings);
        let docnames = [docname];
        for other in &domains {
            if let Some(mine) = self.domains.iter_mut().find(|d| d.name() == other.name()) {
                mine.merge_domaindata(&docnames, other.as_ref());
            }
        }
    }

    fn add_labels(
        &mut self,
        path: &str,
        labels: Vec<(String, Label)>,
        warnings: &mut Vec<BuildWarning>,
    ) {
        for (name, label) in labels {
            if let Some(existing) = self.labels.get(&name) {
                warnings.push(BuildWarning::warning(
                    format!(
                        "duplicate label {}, other instance in {}",
                        name, existing.docname
                    ),
                    Some(Location::new(path, None)),
                ));
            }
            self.labels.insert(name, label);
        }
    }

    /// Replace every pending cross-reference in `node` with a link, as seen from
    /// `fromdocname`. Unknown targets are reported and left as plain text; formats
    /// without addresses get the text only.
    pub fn resolve_references(
        &self,
        node: &mut Element,
        fromdocname: &str,
        format: OutputFormat,
        warnings: &mut Vec<BuildWarning>,
    ) -> usize {
        replace_elements(node, &NodeKind::PendingXref, |xref| {
            let target = xref.attr("reftarget").unwrap_or_default();
            let contnode = xref.children.clone();
            let Some(label) = self.labels.get(target) else {
                let location = xref
                    .source
                    .as_ref()
                    .map(|source| Location::new(source.clone(), xref.line));
                warnings.push(BuildWarning::warning(
                    format!("undefined label: {}", target),
                    location,
                ));
                return contnode;
            };
            let explicit = xref.attr("refexplicit") == Some("true");
            let children = match (&label.title, explicit) {
                (Some(title), false) => vec![Node::text(title.clone())],
                _ => contnode,
            };
            match make_refnode(format, fromdocname, &label.docname, &label.id, children.clone()) {
                Ok(reference) => vec![reference.into()],
                Err(NoUri) => children,
            }
        })
    }
}

/// Build a reference from `fromdocname` to `targetid` in `todocname`.
///
/// Within one document the link is a bare `refid`; otherwise `refuri` holds the
/// format's relative address with the target as fragment.
pub fn make_refnode(
    format: OutputFormat,
    fromdocname: &str,
    todocname: &str,
    targetid: &str,
    children: Vec<Node>,
) -> Result<Element, NoUri> {
    let mut node = Element::new(NodeKind::Reference).with_attr("internal", "true");
    if fromdocname == todocname && !targetid.is_empty() {
        node.set_attr("refid", targetid);
    } else {
        let mut uri = format.get_relative_uri(fromdocname, todocname)?;
        if !targetid.is_empty() {
            uri.push('#');
            uri.push_str(targetid);
        }
        node.set_attr("refuri", uri);
    }
    node.children = children;
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(docname: &str, id: &str, title: Option<&str>) -> Label {
        Label {
            docname: docname.to_string(),
            id: id.to_string(),
            title: title.map(String::from),
        }
    }

    fn read_output(docname: &str, labels: Vec<(String, Label)>) -> ReadOutput {
        ReadOutput {
            doctree: Element::new(NodeKind::Document).with_attr("docname", docname),
            labels,
            warnings: Vec::new(),
        }
    }

    fn xref(target: &str, text: &str, explicit: bool) -> Element {
        Element::with_text(NodeKind::PendingXref, text)
            .with_attr("reftarget", target)
            .with_attr("refexplicit", explicit.to_string())
    }

    #[test]
    fn test_make_refnode_same_document() {
        let node = make_refnode(OutputFormat::Html, "a", "a", "todo-0", vec![]).unwrap();
        assert_eq!(node.attr("refid"), Some("todo-0"));
        assert_eq!(node.attr("refuri"), None);
    }

    #[test]
    fn test_make_refnode_other_document() {
        let node = make_refnode(OutputFormat::Html, "guide/a", "b", "todo-0", vec![]).unwrap();
        assert_eq!(node.attr("refuri"), Some("../b.html#todo-0"));
        let node = make_refnode(OutputFormat::Latex, "a", "b", "todo-0", vec![]).unwrap();
        assert_eq!(node.attr("refuri"), Some("%b#todo-0"));
    }

    #[test]
    fn test_make_refnode_without_uri() {
        assert_eq!(
            make_refnode(OutputFormat::Text, "a", "b", "x", vec![]),
            Err(NoUri)
        );
    }

    #[test]
    fn test_clear_doc_drops_labels_and_order() {
        let mut env = BuildEnvironment::default();
        let mut warnings = Vec::new();
        env.add_document(
            "a",
            "a.tdoc",
            read_output("a", vec![("setup".into(), label("a", "setup", None))]),
            &mut warnings,
        );
        env.add_document("b", "b.tdoc", read_output("b", vec![]), &mut warnings);
        assert_eq!(env.docnames(), ["a", "b"]);
        env.clear_doc("a");
        assert_eq!(env.docnames(), ["b"]);
        assert!(env.label("setup").is_none());
        assert!(env.doctree("a").is_none());
    }

    #[test]
    fn test_readding_moves_document_last() {
        let mut env = BuildEnvironment::default();
        let mut warnings = Vec::new();
        env.add_document("a", "a.tdoc", read_output("a", vec![]), &mut warnings);
        env.add_document("b", "b.tdoc", read_output("b", vec![]), &mut warnings);
        env.add_document("a", "a.tdoc", read_output("a", vec![]), &mut warnings);
        assert_eq!(env.docnames(), ["b", "a"]);
    }

    #[test]
    fn test_duplicate_label_across_documents_warns() {
        let mut env = BuildEnvironment::default();
        let mut warnings = Vec::new();
        env.add_document(
            "a",
            "a.tdoc",
            read_output("a", vec![("x".into(), label("a", "x", None))]),
            &mut warnings,
        );
        env.add_document(
            "b",
            "b.tdoc",
            read_output("b", vec![("x".into(), label("b", "x", None))]),
            &mut warnings,
        );
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("other instance in a"));
        assert_eq!(env.label("x").map(|l| l.docname.as_str()), Some("b"));
    }

    #[test]
    fn test_resolve_references() {
        let mut env = BuildEnvironment::default();
        let mut warnings = Vec::new();
        env.add_document(
            "b",
            "b.tdoc",
            read_output("b", vec![("setup".into(), label("b", "setup", Some("Setup")))]),
            &mut warnings,
        );

        let mut para = Element::new(NodeKind::Paragraph)
            .with_child(xref("setup", "setup", false))
            .with_child(xref("setup", "here", true))
            .with_child(xref("missing", "missing", false));
        let count = env.resolve_references(&mut para, "a", OutputFormat::Html, &mut warnings);
        assert_eq!(count, 3);

        let refs = para.find_all(&NodeKind::Reference);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].astext(), "Setup");
        assert_eq!(refs[0].attr("refuri"), Some("b.html#setup"));
        assert_eq!(refs[1].astext(), "here");
        assert_eq!(para.astext(), "Setupheremissing");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].message, "undefined label: missing");
    }

    #[test]
    fn test_resolve_references_without_uri_keeps_text() {
        let mut env = BuildEnvironment::default();
        let mut warnings = Vec::new();
        env.add_document(
            "b",
            "b.tdoc",
            read_output("b", vec![("setup".into(), label("b", "setup", None))]),
            &mut warnings,
        );
        let mut para = Element::new(NodeKind::Paragraph).with_child(xref("setup", "setup", false));
        env.resolve_references(&mut para, "a", OutputFormat::Text, &mut warnings);
        assert!(para.find_all(&NodeKind::Reference).is_empty());
        assert_eq!(para.astext(), "setup");
        assert!(warnings.is_empty());
    }
}
