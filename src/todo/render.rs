//! Writers for `todo_node`
//!
//! Every format renders the entry as an admonition when annotations are
//! included and skips it, children and all, otherwise.

use crate::doctree::Element;
use crate::renderer::{
    latex::pop_title, tex_escape, HtmlTranslator, LatexTranslator, ManTranslator, NodeHandlers,
    TexinfoTranslator, TextTranslator, Visit,
};

use super::SECTION;

fn included(config: &crate::config::Config) -> bool {
    config.get_bool(SECTION, "include_annotations")
}

pub fn handlers() -> NodeHandlers {
    NodeHandlers::new()
        .html(visit_todo_node_html, depart_todo_node_html)
        .latex(visit_todo_node_latex, depart_todo_node_latex)
        .text(visit_todo_node_text, depart_todo_node_text)
        .man(visit_todo_node_man, depart_todo_node_man)
        .texinfo(visit_todo_node_texinfo, depart_todo_node_texinfo)
}

pub fn visit_todo_node_html(translator: &mut HtmlTranslator<'_>, node: &mut Element) -> Visit {
    if !included(translator.config()) {
        return Visit::SkipNode;
    }
    translator.visit_admonition(node);
    Visit::Continue
}

pub fn depart_todo_node_html(translator: &mut HtmlTranslator<'_>, node: &mut Element) {
    translator.depart_admonition(node);
}

/// The title is written into the environment header, not as a child
pub fn visit_todo_node_latex(translator: &mut LatexTranslator<'_>, node: &mut Element) -> Visit {
    if !included(translator.config()) {
        return Visit::SkipNode;
    }
    let targets = translator.hypertarget_to(node);
    let title = pop_title(node).unwrap_or_default();
    translator.body.push_str("\n\\begin{sphinxadmonition}{note}{");
    translator.body.push_str(&targets);
    translator.body.push_str(&format!("{}:}}", tex_escape(&title)));
    Visit::Continue
}

pub fn depart_todo_node_latex(translator: &mut LatexTranslator<'_>, _node: &mut Element) {
    translator.body.push_str("\\end{sphinxadmonition}\n");
}

pub fn visit_todo_node_text(translator: &mut TextTranslator<'_>, node: &mut Element) -> Visit {
    if !included(translator.config()) {
        return Visit::SkipNode;
    }
    translator.visit_admonition(node);
    Visit::Continue
}

pub fn depart_todo_node_text(translator: &mut TextTranslator<'_>, node: &mut Element) {
    translator.depart_admonition(node);
}

pub fn visit_todo_node_man(translator: &mut ManTranslator<'_>, node: &mut Element) -> Visit {
    if !included(translator.config()) {
        return Visit::SkipNode;
    }
    translator.visit_admonition(node);
    Visit::Continue
}

pub fn depart_todo_node_man(translator: &mut ManTranslator<'_>, node: &mut Element) {
    translator.depart_admonition(node);
}

pub fn visit_todo_node_texinfo(translator: &mut TexinfoTranslator<'_>, node: &mut Element) -> Visit {
    if !included(translator.config()) {
        return Visit::SkipNode;
    }
    translator.visit_admonition(node);
    Visit::Continue
}

pub fn depart_todo_node_texinfo(translator: &mut TexinfoTranslator<'_>, node: &mut Element) {
    translator.depart_admonition(node);
}
