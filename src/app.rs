//! The application object extensions register themselves with

use serde::Serialize;
use thiserror::Error;

use crate::build::DoctreeResolvedHook;
use crate::config::{Config, ConfigError};
use crate::env::{BuildEnvironment, Domain};
use crate::events::{EventBus, EventError, Listener};
use crate::reader::{AdmonitionDirective, Directive, DirectiveRegistry};
use crate::renderer::{NodeHandlers, NodeRegistry};

/// Entry point of an extension
pub type ExtensionSetup = fn(&mut App) -> Result<ExtensionMetadata, AppError>;

/// What an extension reports about itself once set up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionMetadata {
    pub version: String,
    /// Bumped whenever the shape of the extension's per-build data changes
    pub env_version: u32,
    /// Documents may be read by parallel workers and merged afterwards
    pub parallel_read_safe: bool,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("unknown extension: {0}")]
    UnknownExtension(String),
    #[error("directive {0} is already registered")]
    DirectiveExists(String),
    #[error("node type {0} is already registered")]
    NodeExists(String),
    #[error("domain {0} is already registered")]
    DomainExists(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Event(#[from] EventError),
}

/// Extensions shipped with the crate, by name
fn builtin_extension(name: &str) -> Option<ExtensionSetup> {
    match name {
        "todo" => Some(crate::todo::setup),
        _ => None,
    }
}

pub struct App {
    config: Config,
    directives: DirectiveRegistry,
    nodes: NodeRegistry,
    events: EventBus,
    domains: Vec<Box<dyn Domain>>,
    resolved_hooks: Vec<DoctreeResolvedHook>,
    extensions: Vec<(String, ExtensionMetadata)>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("directives", &self.directives)
            .field("nodes", &self.nodes)
            .field("events", &self.events)
            .field("extensions", &self.extensions)
            .finish()
    }
}

impl App {
    /// Host built-ins plus every extension named in `build.extensions`
    pub fn new(config: Config) -> Result<Self, AppError> {
        let mut app = Self::bare(config);
        let names = app.config.build.extensions.clone();
        for name in &names {
            app.setup_extension(name)?;
        }
        for key in app.config.unknown_keys() {
            tracing::warn!("unknown config value: {}", key);
        }
        Ok(app)
    }

    /// Host built-ins only
    pub fn bare(config: Config) -> Self {
        let mut directives = DirectiveRegistry::new();
        directives.add("note", Box::new(AdmonitionDirective::new("Note")));
        directives.add("warning", Box::new(AdmonitionDirective::new("Warning")));
        Self {
            config,
            directives,
            nodes: NodeRegistry::new(),
            events: EventBus::new(),
            domains: Vec::new(),
            resolved_hooks: Vec::new(),
            extensions: Vec::new(),
        }
    }

    /// Load a built-in extension; loading the same one twice is a no-op
    pub fn setup_extension(&mut self, name: &str) -> Result<(), AppError> {
        if self.extension(name).is_some() {
            return Ok(());
        }
        let setup =
            builtin_extension(name).ok_or_else(|| AppError::UnknownExtension(name.to_string()))?;
        let metadata = setup(self)?;
        tracing::debug!(extension = name, version = %metadata.version, "extension loaded");
        self.extensions.push((name.to_string(), metadata));
        Ok(())
    }

    pub fn add_directive(&mut self, name: &str, directive: Box<dyn Directive>) -> Result<(), AppError> {
        if self.directives.contains(name) {
            return Err(AppError::DirectiveExists(name.to_string()));
        }
        self.directives.add(name, directive);
        Ok(())
    }

    pub fn add_node(&mut self, name: &str, handlers: NodeHandlers) -> Result<(), AppError> {
        if self.nodes.contains(name) {
            return Err(AppError::NodeExists(name.to_string()));
        }
        self.nodes.add(name, handlers);
        Ok(())
    }

    pub fn add_event(&mut self, name: &str) -> Result<(), AppError> {
        Ok(self.events.add_event(name)?)
    }

    pub fn connect(&mut self, event: &str, listener: Listener) -> Result<(), AppError> {
        Ok(self.events.connect(event, listener)?)
    }

    /// Run `hook` on every document once its references are resolved
    pub fn connect_doctree_resolved(&mut self, hook: DoctreeResolvedHook) {
        self.resolved_hooks.push(hook);
    }

    pub fn add_domain(&mut self, domain: Box<dyn Domain>) -> Result<(), AppError> {
        if self.domains.iter().any(|d| d.name() == domain.name()) {
            return Err(AppError::DomainExists(domain.name().to_string()));
        }
        self.domains.push(domain);
        Ok(())
    }

    pub fn add_config_value(
        &mut self,
        section: &str,
        key: &str,
        default: impl Into<toml::Value>,
    ) -> Result<(), AppError> {
        Ok(self.config.add_value(section, key, default)?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn directives(&self) -> &DirectiveRegistry {
        &self.directives
    }

    pub fn nodes(&self) -> &NodeRegistry {
        &self.nodes
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn resolved_hooks(&self) -> &[DoctreeResolvedHook] {
        &self.resolved_hooks
    }

    pub fn extension(&self, name: &str) -> Option<&ExtensionMetadata> {
        self.extensions
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m)
    }

    /// Whether every loaded extension allows parallel reading
    pub fn parallel_read_safe(&self) -> bool {
        self.extensions.iter().all(|(_, m)| m.parallel_read_safe)
    }

    /// Empty instances of every registered domain
    pub fn fresh_domains(&self) -> Vec<Box<dyn Domain>> {
        self.domains.iter().map(|d| d.fresh()).collect()
    }

    /// A new, empty environment for one build
    pub fn new_environment(&self) -> BuildEnvironment {
        BuildEnvironment::new(self.fresh_domains())
    }
}
