//! A project on disk: a source tree, a `doctodo.toml` and an output directory

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::app::App;
use crate::build::{BuildContext, SourceDoc};
use crate::builder::OutputFormat;
use crate::config::{Config, CONFIG_FILE};
use crate::diagnostics::BuildWarning;
use crate::renderer::WriterConfig;
use crate::todo::{Marker, TodoDomain};
use crate::BuildError;

/// Outcome of building every document of a project
#[derive(Debug, Default, Serialize)]
pub struct BuildReport {
    /// Files written, in document processing order
    pub written: Vec<PathBuf>,
    pub warnings: Vec<BuildWarning>,
}

/// Every todo entry of a project, without writing anything
#[derive(Debug, Default, Serialize)]
pub struct TodoReport {
    pub todos: Vec<Marker>,
    pub warnings: Vec<BuildWarning>,
}

#[derive(Debug)]
pub struct Project {
    root: PathBuf,
    app: App,
}

impl Project {
    /// Open the project at `root`, see [`load_config`]
    pub fn open(root: impl Into<PathBuf>, config_path: Option<&Path>) -> Result<Self, BuildError> {
        let root = root.into();
        let config = load_config(&root, config_path)?;
        Self::with_config(root, config)
    }

    pub fn with_config(root: impl Into<PathBuf>, config: Config) -> Result<Self, BuildError> {
        let app = App::new(config)?;
        Ok(Self {
            root: root.into(),
            app,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn config(&self) -> &Config {
        self.app.config()
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root.join(&self.config().build.source_dir)
    }

    pub fn out_dir(&self) -> PathBuf {
        self.root.join(&self.config().build.out_dir)
    }

    /// Every source document below the source directory, sorted by path.
    /// The output directory and hidden directories are skipped.
    pub fn discover(&self) -> Result<Vec<SourceDoc>, BuildError> {
        let source_dir = self.source_dir();
        let out_dir = self.out_dir();
        let suffix = self.config().build.source_suffix.as_str();

        let mut sources = Vec::new();
        let walker = WalkDir::new(&source_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !(e.path() == out_dir || e.file_name().to_string_lossy().starts_with('.'))
            });
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&source_dir) else {
                continue;
            };
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let Some(docname) = relative.strip_suffix(suffix) else {
                continue;
            };
            if docname.is_empty() {
                continue;
            }
            let text = fs::read_to_string(entry.path()).map_err(|source| BuildError::Io {
                path: entry.path().to_path_buf(),
                source,
            })?;
            sources.push(SourceDoc::new(docname, relative.as_str(), text));
        }
        tracing::debug!(dir = %source_dir.display(), documents = sources.len(), "discovered sources");
        Ok(sources)
    }

    /// Build every document into `<out_dir>/<format>/<docname><suffix>`
    pub fn build(&self, format: OutputFormat) -> Result<BuildReport, BuildError> {
        let sources = self.discover()?;
        let mut writer = WriterConfig::new().with_standalone(true);
        if let Some(name) = &self.config().project.name {
            writer = writer.with_title(name.clone());
        }
        let mut build = BuildContext::new(&self.app, format).with_writer(writer);
        build.read_sources(&sources)?;

        let target_dir = self.out_dir().join(format.name());
        let mut report = BuildReport::default();
        for docname in build.env().docnames().to_vec() {
            let output = build.write(&docname)?;
            let path = target_dir.join(format!("{}{}", docname, format.suffix()));
            write_file(&path, &output)?;
            tracing::debug!(path = %path.display(), "written");
            report.written.push(path);
        }
        report.warnings = build.take_warnings();
        tracing::info!(
            format = %format,
            documents = report.written.len(),
            warnings = report.warnings.len(),
            "build finished"
        );
        Ok(report)
    }

    /// Read every document and return the collected todo entries
    pub fn collect_todos(&self) -> Result<TodoReport, BuildError> {
        let sources = self.discover()?;
        let mut build = BuildContext::new(&self.app, self.config().build.format);
        build.read_sources(&sources)?;
        let todos = build
            .env()
            .domain::<TodoDomain>()
            .map(|domain| domain.all_todos().cloned().collect())
            .unwrap_or_default();
        Ok(TodoReport {
            todos,
            warnings: build.take_warnings(),
        })
    }
}

/// Read `config_path`, or else `root/doctodo.toml` when it exists, or else defaults
pub fn load_config(root: &Path, config_path: Option<&Path>) -> Result<Config, BuildError> {
    match config_path {
        Some(path) => Ok(Config::from_file(path)?),
        None => {
            let default = root.join(CONFIG_FILE);
            if default.is_file() {
                Ok(Config::from_file(&default)?)
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), BuildError> {
    let io_err = |source: std::io::Error| BuildError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, contents).map_err(io_err)
}
