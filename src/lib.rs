//! doctodo - todo annotations for a small documentation build system
//!
//! Documents are written in a brace-delimited markup, read into doctrees, collected
//! into a build environment and written out as HTML, LaTeX, plain text, man pages or Texinfo.
//! The bundled `todo` extension adds `@todo` entries and `@todolist` placeholders
//! that gather every entry of the project, each with a link back to its origin.
//!
//! # Example
//!
//! ```rust
//! use doctodo::{render_with_config, RenderConfig};
//!
//! let html = render_with_config(
//!     "@todo \"Write the intro.\"\n@todolist",
//!     RenderConfig::new().with_include_annotations(true),
//! )
//! .unwrap();
//! assert!(html.contains("Write the intro."));
//! assert!(html.contains("original entry"));
//! ```

pub mod app;
pub mod build;
pub mod builder;
pub mod config;
pub mod diagnostics;
pub mod doctree;
pub mod env;
pub mod error;
pub mod events;
pub mod parser;
pub mod project;
pub mod reader;
pub mod renderer;
pub mod todo;

use std::path::PathBuf;

pub use app::{App, AppError, ExtensionMetadata};
pub use build::{BuildContext, SourceDoc};
pub use builder::{NoUri, OutputFormat};
pub use config::{Config, ConfigError};
pub use diagnostics::{BuildWarning, Location, Severity};
pub use doctree::{Element, Node, NodeKind};
pub use error::ParseError;
pub use parser::parse;
pub use events::EventError;
pub use project::{BuildReport, Project};
pub use renderer::{WriteError, WriterConfig};

use thiserror::Error;

/// Errors that stop a build
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Event(#[from] EventError),

    #[error("write error: {0}")]
    Write(#[from] WriteError),

    #[error("failed to start reader threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to scan sources: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown document: {0}")]
    UnknownDocument(String),
}

/// Configuration for rendering a single document
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub config: Config,
    pub format: OutputFormat,
    pub writer: WriterConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            config: Config::default(),
            format: OutputFormat::Html,
            writer: WriterConfig::default(),
        }
    }
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_writer(mut self, writer: WriterConfig) -> Self {
        self.writer = writer;
        self
    }

    /// Shorthand for setting `todo.include_annotations`
    pub fn with_include_annotations(mut self, include: bool) -> Self {
        self.config.set(todo::SECTION, "include_annotations", include);
        self
    }
}

/// Render one document to HTML with default configuration
///
/// # Example
///
/// ```rust
/// let html = doctodo::render("para \"Hello\"").unwrap();
/// assert_eq!(html, "<p>Hello</p>\n");
/// ```
pub fn render(source: &str) -> Result<String, BuildError> {
    render_with_config(source, RenderConfig::default())
}

/// Render one document, named `index`, as a project of its own
pub fn render_with_config(source: &str, config: RenderConfig) -> Result<String, BuildError> {
    let app = App::new(config.config)?;
    let mut build = BuildContext::new(&app, config.format).with_writer(config.writer);
    build.read_sources(&[SourceDoc::inline("index", source)])?;
    build.write("index")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_paragraph() {
        assert_eq!(render("para \"a & b\"").unwrap(), "<p>a &amp; b</p>\n");
    }

    #[test]
    fn test_todo_hidden_by_default() {
        let html = render("para \"x\"\n@todo \"secret\"\n@todolist").unwrap();
        assert!(!html.contains("secret"));
    }

    #[test]
    fn test_render_with_config_text() {
        let out = render_with_config(
            "@todo \"fix X\"\n@todolist",
            RenderConfig::new()
                .with_format(OutputFormat::Text)
                .with_include_annotations(true),
        )
        .unwrap();
        assert!(out.contains("(The *original entry* is located in index.tdoc, line 1.)"));
    }

    #[test]
    fn test_syntax_error_is_not_fatal() {
        let html = render("para {").unwrap();
        assert!(html.contains("System Message"));
    }

    #[test]
    fn test_bad_config_type() {
        let config = Config::new().with_value("todo", "link_only", "yes");
        let err = render_with_config("para \"x\"", RenderConfig::new().with_config(config));
        assert!(matches!(err, Err(BuildError::App(AppError::Config(_)))));
    }
}
