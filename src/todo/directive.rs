//! `@todo` and `@todolist`

use crate::doctree::{Element, Node, NodeKind};
use crate::reader::{
    run_admonition, Directive, DirectiveSpec, Invocation, ReaderContext, ADMONITION_OPTIONS,
};

use super::{todo_node, todolist};

/// A todo entry, rendered as an admonition when annotations are included
pub struct TodoDirective;

impl Directive for TodoDirective {
    fn spec(&self) -> DirectiveSpec {
        DirectiveSpec {
            has_content: true,
            options: ADMONITION_OPTIONS,
        }
    }

    fn run(&self, invocation: &Invocation<'_>, ctx: &mut ReaderContext<'_>) -> Vec<Node> {
        let mut todo = match run_admonition(invocation, ctx, todo_node(), "admonition-todo") {
            Ok(todo) => todo,
            Err(message) => return vec![message],
        };
        todo.children
            .insert(0, Element::with_text(NodeKind::Title, "Todo").into());
        todo.set_attr("docname", ctx.docname());
        ctx.note_explicit_target(&mut todo, "todo", None);
        vec![todo.into()]
    }
}

/// Placeholder for the list of every todo entry in the project
pub struct TodoListDirective;

impl Directive for TodoListDirective {
    fn spec(&self) -> DirectiveSpec {
        DirectiveSpec {
            has_content: false,
            options: &[],
        }
    }

    fn run(&self, invocation: &Invocation<'_>, ctx: &mut ReaderContext<'_>) -> Vec<Node> {
        let mut placeholder = Element::new(todolist());
        ctx.set_source_info(&mut placeholder, invocation.line);
        vec![placeholder.into()]
    }
}
