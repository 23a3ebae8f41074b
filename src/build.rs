//! One build: read every source, resolve, write
//!
//! Reading is the only phase that may run in parallel. Each worker reads one
//! document into fresh domain instances; the results are then merged into the
//! environment in input order. Resolution and writing run serially against the
//! merged environment.

use rayon::prelude::*;

use crate::app::App;
use crate::builder::OutputFormat;
use crate::config::Config;
use crate::diagnostics::BuildWarning;
use crate::doctree::Element;
use crate::env::{BuildEnvironment, DocumentRead, ProcessContext};
use crate::events::EventError;
use crate::reader::read_document;
use crate::renderer::{translate, WriterConfig};
use crate::BuildError;

/// Callback run on every document after its references are resolved
pub type DoctreeResolvedHook = fn(&mut ResolveContext<'_>, &mut Element, &str);

/// What a doctree-resolved hook can see
pub struct ResolveContext<'a> {
    pub config: &'a Config,
    pub env: &'a BuildEnvironment,
    pub format: OutputFormat,
    pub warnings: &'a mut Vec<BuildWarning>,
}

/// A source document to read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDoc {
    pub docname: String,
    /// Path shown in diagnostics and backlinks
    pub path: String,
    pub text: String,
}

impl SourceDoc {
    pub fn new(docname: impl Into<String>, path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            docname: docname.into(),
            path: path.into(),
            text: text.into(),
        }
    }

    /// A document whose path is derived from its name and the default suffix
    pub fn inline(docname: &str, text: impl Into<String>) -> Self {
        Self::new(docname, format!("{}.tdoc", docname), text)
    }
}

/// Explicit state of one build
pub struct BuildContext<'app> {
    app: &'app App,
    format: OutputFormat,
    env: BuildEnvironment,
    warnings: Vec<BuildWarning>,
    writer: WriterConfig,
}

impl<'app> BuildContext<'app> {
    pub fn new(app: &'app App, format: OutputFormat) -> Self {
        Self {
            app,
            format,
            env: app.new_environment(),
            warnings: Vec::new(),
            writer: WriterConfig::default(),
        }
    }

    pub fn with_writer(mut self, writer: WriterConfig) -> Self {
        self.writer = writer;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn env(&self) -> &BuildEnvironment {
        &self.env
    }

    pub fn warnings(&self) -> &[BuildWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<BuildWarning> {
        std::mem::take(&mut self.warnings)
    }

    /// Read every source. Uses `build.jobs` workers when every loaded extension
    /// is parallel-read safe.
    pub fn read_sources(&mut self, sources: &[SourceDoc]) -> Result<(), BuildError> {
        let jobs = self.app.config().build.jobs;
        if jobs > 1 && sources.len() > 1 && self.app.parallel_read_safe() {
            tracing::info!(documents = sources.len(), jobs, "reading sources in parallel");
            let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
            let app = self.app;
            let reads: Vec<Result<DocumentRead, EventError>> =
                pool.install(|| sources.par_iter().map(|s| read_isolated(app, s)).collect());
            for read in reads {
                self.env.merge_read(read?, &mut self.warnings);
            }
        } else {
            tracing::info!(documents = sources.len(), "reading sources");
            for source in sources {
                self.update_document(source)?;
            }
        }
        Ok(())
    }

    /// Read (or re-read) one document on this thread
    pub fn update_document(&mut self, source: &SourceDoc) -> Result<(), BuildError> {
        tracing::debug!(docname = %source.docname, "reading");
        let output = read_document(
            &source.docname,
            &source.path,
            &source.text,
            self.app.config(),
            self.app.directives(),
        );
        self.env
            .add_document(&source.docname, &source.path, output, &mut self.warnings);
        let mut ctx = ProcessContext {
            config: self.app.config(),
            events: self.app.events(),
            warnings: &mut self.warnings,
        };
        self.env.process_doc(&mut ctx, &source.docname)?;
        Ok(())
    }

    /// Drop a document from the project
    pub fn remove_document(&mut self, docname: &str) {
        tracing::debug!(docname, "removing");
        self.env.clear_doc(docname);
    }

    /// A resolved copy of `docname`: cross-references first, then every
    /// doctree-resolved hook. The stored doctree is left untouched.
    pub fn resolve(&mut self, docname: &str) -> Option<Element> {
        let mut doctree = self.env.doctree(docname)?.clone();
        self.env
            .resolve_references(&mut doctree, docname, self.format, &mut self.warnings);
        let mut ctx = ResolveContext {
            config: self.app.config(),
            env: &self.env,
            format: self.format,
            warnings: &mut self.warnings,
        };
        for hook in self.app.resolved_hooks() {
            hook(&mut ctx, &mut doctree, docname);
        }
        Some(doctree)
    }

    /// Resolve and render one document
    pub fn write(&mut self, docname: &str) -> Result<String, BuildError> {
        let mut doctree = self
            .resolve(docname)
            .ok_or_else(|| BuildError::UnknownDocument(docname.to_string()))?;
        Ok(translate(
            self.format,
            &mut doctree,
            docname,
            self.app.config(),
            self.app.nodes(),
            &self.writer,
        )?)
    }

    /// Render every document, in processing order
    pub fn write_all(&mut self) -> Result<Vec<(String, String)>, BuildError> {
        let docnames = self.env.docnames().to_vec();
        docnames
            .into_iter()
            .map(|docname| {
                let output = self.write(&docname)?;
                Ok((docname, output))
            })
            .collect()
    }
}

/// Read and process one document away from the environment
fn read_isolated(app: &App, source: &SourceDoc) -> Result<DocumentRead, EventError> {
    let mut output = read_document(
        &source.docname,
        &source.path,
        &source.text,
        app.config(),
        app.directives(),
    );
    let mut domains = app.fresh_domains();
    let mut warnings = Vec::new();
    let mut ctx = ProcessContext {
        config: app.config(),
        events: app.events(),
        warnings: &mut warnings,
    };
    for domain in &mut domains {
        domain.process_doc(&mut ctx, &source.docname, &output.doctree)?;
    }
    output.warnings.extend(warnings);
    Ok(DocumentRead {
        docname: source.docname.clone(),
        path: source.path.clone(),
        output,
        domains,
    })
}
