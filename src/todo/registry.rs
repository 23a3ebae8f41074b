//! Per-build registry of todo entries, partitioned by document

use std::any::Any;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{BuildWarning, Location};
use crate::doctree::Element;
use crate::env::{Domain, ProcessContext};
use crate::events::EventError;

use super::{todo_node, TodoSettings, TODO_DEFINED};

/// One todo entry and where it was written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub docname: String,
    pub source: String,
    pub line: Option<usize>,
    /// Anchor the backlink points at
    pub target_id: String,
    pub node: Element,
}

impl Marker {
    pub fn from_node(docname: &str, node: &Element) -> Self {
        Self {
            docname: docname.to_string(),
            source: node.source.clone().unwrap_or_default(),
            line: node.line,
            target_id: node.ids.first().cloned().unwrap_or_default(),
            node: node.clone(),
        }
    }

    /// Body text of the entry, without its title
    pub fn text(&self) -> String {
        self.node
            .children
            .get(1)
            .map(|child| child.astext())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TodoDomain {
    /// Slots in document processing order
    todos: Vec<(String, Vec<Marker>)>,
}

impl TodoDomain {
    pub fn todos_for(&self, docname: &str) -> Option<&[Marker]> {
        self.todos
            .iter()
            .find(|(d, _)| d == docname)
            .map(|(_, markers)| markers.as_slice())
    }

    /// Every entry of the project: document order, then position in the document
    pub fn all_todos(&self) -> impl Iterator<Item = &Marker> {
        self.todos.iter().flat_map(|(_, markers)| markers.iter())
    }

    pub fn docnames(&self) -> impl Iterator<Item = &str> {
        self.todos.iter().map(|(d, _)| d.as_str())
    }

    fn set_slot(&mut self, docname: &str, markers: Vec<Marker>) {
        self.clear_doc(docname);
        self.todos.push((docname.to_string(), markers));
    }
}

impl Domain for TodoDomain {
    fn name(&self) -> &'static str {
        "todo"
    }

    fn fresh(&self) -> Box<dyn Domain> {
        Box::new(TodoDomain::default())
    }

    fn clear_doc(&mut self, docname: &str) {
        self.todos.retain(|(d, _)| d != docname);
    }

    fn merge_domaindata(&mut self, docnames: &[String], other: &dyn Domain) {
        let Some(other) = other.as_any().downcast_ref::<TodoDomain>() else {
            return;
        };
        for docname in docnames {
            if let Some(markers) = other.todos_for(docname) {
                self.set_slot(docname, markers.to_vec());
            }
        }
    }

    fn process_doc(
        &mut self,
        ctx: &mut ProcessContext<'_>,
        docname: &str,
        document: &Element,
    ) -> Result<(), EventError> {
        let settings = TodoSettings::from_config(ctx.config);
        let kind = todo_node();
        let mut markers = Vec::new();
        for todo in document.find_all(&kind) {
            ctx.events.emit(TODO_DEFINED, todo)?;
            let marker = Marker::from_node(docname, todo);
            if settings.emit_warnings {
                ctx.warnings.push(BuildWarning::warning(
                    format!("TODO entry found: {}", marker.text()),
                    Some(Location::new(marker.source.clone(), marker.line)),
                ));
            }
            markers.push(marker);
        }
        tracing::debug!(docname, count = markers.len(), "collected todo entries");
        self.set_slot(docname, markers);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
