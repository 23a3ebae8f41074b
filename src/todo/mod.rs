//! Todo annotations
//!
//! `@todo` marks an entry in place; `@todolist` is replaced, once every document
//! has been read, by a copy of every entry in the project followed by a link back
//! to where it was written. Rendering of both is gated by `todo.include_annotations`.
//!
//! ```text
//! [todo]
//! include_annotations = true   # render entries and lists
//! link_only = false            # backlink without "located in FILE, line N"
//! emit_warnings = false        # warn about every entry while reading
//! ```

pub mod directive;
pub mod registry;
pub mod render;
pub mod resolver;

use crate::app::{App, AppError, ExtensionMetadata};
use crate::config::Config;
use crate::doctree::NodeKind;
use crate::renderer::NodeHandlers;

pub use directive::{TodoDirective, TodoListDirective};
pub use registry::{Marker, TodoDomain};
pub use resolver::process_todo_nodes;

/// Marker node type
pub const TODO_NODE: &str = "todo_node";
/// Placeholder node type
pub const TODOLIST: &str = "todolist";
/// Raised once per marker while a document is processed
pub const TODO_DEFINED: &str = "todo-defined";
/// Config table of the extension
pub const SECTION: &str = "todo";

pub fn todo_node() -> NodeKind {
    NodeKind::custom(TODO_NODE)
}

pub fn todolist() -> NodeKind {
    NodeKind::custom(TODOLIST)
}

/// The extension's configuration values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodoSettings {
    pub include_annotations: bool,
    pub link_only: bool,
    pub emit_warnings: bool,
}

impl TodoSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            include_annotations: config.get_bool(SECTION, "include_annotations"),
            link_only: config.get_bool(SECTION, "link_only"),
            emit_warnings: config.get_bool(SECTION, "emit_warnings"),
        }
    }
}

pub fn setup(app: &mut App) -> Result<ExtensionMetadata, AppError> {
    app.add_event(TODO_DEFINED)?;
    app.add_config_value(SECTION, "include_annotations", false)?;
    app.add_config_value(SECTION, "link_only", false)?;
    app.add_config_value(SECTION, "emit_warnings", false)?;

    app.add_node(TODOLIST, NodeHandlers::new())?;
    app.add_node(TODO_NODE, render::handlers())?;

    app.add_directive("todo", Box::new(TodoDirective))?;
    app.add_directive("todolist", Box::new(TodoListDirective))?;
    app.add_domain(Box::new(TodoDomain::default()))?;
    app.connect_doctree_resolved(process_todo_nodes);

    Ok(ExtensionMetadata {
        version: env!("CARGO_PKG_VERSION").to_string(),
        env_version: 2,
        parallel_read_safe: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default_to_false() {
        let app = App::new(Config::default()).unwrap();
        assert_eq!(TodoSettings::from_config(app.config()), TodoSettings::default());
    }

    #[test]
    fn test_settings_from_file() {
        let config = Config::from_str("[todo]\ninclude_annotations = true\nlink_only = true").unwrap();
        let app = App::new(config).unwrap();
        let settings = TodoSettings::from_config(app.config());
        assert!(settings.include_annotations);
        assert!(settings.link_only);
        assert!(!settings.emit_warnings);
    }
}
