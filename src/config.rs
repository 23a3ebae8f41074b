//! Project configuration loaded from `doctodo.toml`
//!
//! The `[project]` and `[build]` tables are typed. Every other table belongs to an
//! extension, which registers the keys it understands (with their defaults) through
//! [`Config::add_value`]. Values are looked up by `section.key`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::builder::OutputFormat;

/// Default configuration file name looked up in a project root
pub const CONFIG_FILE: &str = "doctodo.toml";

/// Errors that can occur when loading or querying configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("config value '{name}' must be {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },
    #[error("config value '{0}' is already registered")]
    AlreadyRegistered(String),
}

/// `[project]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub name: Option<String>,
}

/// `[build]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory scanned for sources, relative to the project root
    pub source_dir: PathBuf,
    /// Output directory, relative to the project root
    pub out_dir: PathBuf,
    pub format: OutputFormat,
    /// Worker threads used while reading sources; 1 reads serially
    pub jobs: usize,
    pub source_suffix: String,
    pub extensions: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            out_dir: PathBuf::from("_build"),
            format: OutputFormat::Html,
            jobs: 1,
            source_suffix: ".tdoc".to_string(),
            extensions: vec!["todo".to_string()],
        }
    }
}

/// Complete configuration for one build
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub project: ProjectConfig,
    pub build: BuildConfig,
    /// Extension tables as written in the file (or set programmatically)
    sections: toml::Table,
    /// Registered extension values and their defaults, keyed by `section.key`
    defaults: BTreeMap<String, toml::Value>,
}

impl Config {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let mut table: toml::Table = toml::from_str(content)?;

        let project = match table.remove("project") {
            Some(value) => value.try_into()?,
            None => ProjectConfig::default(),
        };
        let build = match table.remove("build") {
            Some(value) => value.try_into()?,
            None => BuildConfig::default(),
        };

        Ok(Config {
            project,
            build,
            sections: table,
            defaults: BTreeMap::new(),
        })
    }

    /// Register an extension value with its default.
    ///
    /// Fails when the file already holds a value of a different TOML type.
    pub fn add_value(
        &mut self,
        section: &str,
        key: &str,
        default: impl Into<toml::Value>,
    ) -> Result<(), ConfigError> {
        let name = format!("{}.{}", section, key);
        if self.defaults.contains_key(&name) {
            return Err(ConfigError::AlreadyRegistered(name));
        }
        let default = default.into();
        if let Some(current) = self.lookup(section, key) {
            if current.type_str() != default.type_str() {
                return Err(ConfigError::TypeMismatch {
                    name,
                    expected: default.type_str().to_string(),
                    found: current.type_str().to_string(),
                });
            }
        }
        self.defaults.insert(name, default);
        Ok(())
    }

    /// Set a value, overriding the file
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<toml::Value>) {
        let entry = self
            .sections
            .entry(section.to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        if let toml::Value::Table(table) = entry {
            table.insert(key.to_string(), value.into());
        }
    }

    /// Builder-style [`Config::set`]
    pub fn with_value(mut self, section: &str, key: &str, value: impl Into<toml::Value>) -> Self {
        self.set(section, key, value);
        self
    }

    /// Value from the file, else the registered default
    pub fn get(&self, section: &str, key: &str) -> Option<&toml::Value> {
        self.lookup(section, key)
            .or_else(|| self.defaults.get(&format!("{}.{}", section, key)))
    }

    /// Boolean value; missing or non-boolean values read as `false`
    pub fn get_bool(&self, section: &str, key: &str) -> bool {
        self.get(section, key)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Whether an extension registered `section.key`
    pub fn is_registered(&self, section: &str, key: &str) -> bool {
        self.defaults.contains_key(&format!("{}.{}", section, key))
    }

    /// Keys present in the file under registered sections that no extension registered
    pub fn unknown_keys(&self) -> Vec<String> {
        let mut unknown = Vec::new();
        for (section, value) in &self.sections {
            let registered_section = self
                .defaults
                .keys()
                .any(|name| name.starts_with(&format!("{}.", section)));
            match value {
                toml::Value::Table(table) if registered_section => {
                    for key in table.keys() {
                        if !self.is_registered(section, key) {
                            unknown.push(format!("{}.{}", section, key));
                        }
                    }
                }
                _ if !registered_section => unknown.push(section.clone()),
                _ => {}
            }
        }
        unknown
    }

    fn lookup(&self, section: &str, key: &str) -> Option<&toml::Value> {
        self.sections
            .get(section)
            .and_then(|v| v.as_table())
            .and_then(|t| t.get(key))
    }
}
