//! Replacing `@todolist` placeholders once every document has been read

use crate::build::ResolveContext;
use crate::builder::{NoUri, OutputFormat};
use crate::doctree::{replace_elements, Element, Node, NodeKind};
use crate::env::make_refnode;

use super::{todolist, Marker, TodoDomain, TodoSettings};

/// Doctree-resolved hook: splice every project todo entry in place of each
/// placeholder of `doctree`.
///
/// Each entry is a fresh copy of the marker, with cross-references resolved as
/// seen from the marker's own document, followed by a backlink paragraph.
pub fn process_todo_nodes(ctx: &mut ResolveContext<'_>, doctree: &mut Element, fromdocname: &str) {
    let settings = TodoSettings::from_config(ctx.config);
    let format = ctx.format;
    let env = ctx.env;
    let warnings = &mut *ctx.warnings;
    let markers: Vec<&Marker> = env
        .domain::<TodoDomain>()
        .map(|domain| domain.all_todos().collect())
        .unwrap_or_default();

    let replaced = replace_elements(doctree, &todolist(), |placeholder| {
        let mut content = Vec::new();
        if !placeholder.ids.is_empty() {
            let mut target = Element::new(NodeKind::Target);
            target.ids = placeholder.ids.clone();
            content.push(target.into());
        }
        if !settings.include_annotations {
            return content;
        }
        for marker in &markers {
            let mut entry = marker.node.fresh_copy();
            env.resolve_references(&mut entry, &marker.docname, format, warnings);
            content.push(entry.into());
            content.push(backlink(marker, fromdocname, format, settings.link_only).into());
        }
        content
    });
    if replaced > 0 {
        tracing::debug!(
            docname = fromdocname,
            placeholders = replaced,
            entries = markers.len(),
            "resolved todo lists"
        );
    }
}

/// Paragraph pointing from `fromdocname` back at the original entry
fn backlink(
    marker: &Marker,
    fromdocname: &str,
    format: OutputFormat,
    link_only: bool,
) -> Element {
    let (prefix, suffix) = if link_only {
        (String::new(), String::new())
    } else {
        (
            "(The ".to_string(),
            format!(
                " is located in {}, line {}.)",
                marker.source,
                marker.line.unwrap_or(0)
            ),
        )
    };

    let linktext = Element::with_text(NodeKind::Emphasis, "original entry");
    let link: Node = match make_refnode(
        format,
        fromdocname,
        &marker.docname,
        &marker.target_id,
        vec![linktext.clone().into()],
    ) {
        Ok(reference) => reference.into(),
        Err(NoUri) => linktext.into(),
    };

    let mut para = Element::new(NodeKind::Paragraph).with_class("todo-source");
    if !prefix.is_empty() {
        para.push(Node::text(prefix));
    }
    para.push(link);
    if !suffix.is_empty() {
        para.push(Node::text(suffix));
    }
    para
}
