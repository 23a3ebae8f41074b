//! Build warnings collected while reading and resolving documents
//!
//! Every warning is logged through `tracing` where it is produced and also kept as a
//! value, so callers can count, print or fail on them.

use std::fmt;

use serde::Serialize;

/// Severity of a build diagnostic, mirroring system message levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Info = 1,
    Warning = 2,
    Error = 3,
    Severe = 4,
}

impl Severity {
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Severe => "SEVERE",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Source location of a diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub source: String,
    pub line: Option<usize>,
}

impl Location {
    pub fn new(source: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            source: source.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.source, line),
            None => f.write_str(&self.source),
        }
    }
}

/// A diagnostic produced during the build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildWarning {
    pub severity: Severity,
    pub message: String,
    pub location: Option<Location>,
}

impl BuildWarning {
    pub fn new(severity: Severity, message: impl Into<String>, location: Option<Location>) -> Self {
        Self {
            severity,
            message: message.into(),
            location,
        }
    }

    /// A `WARNING` level diagnostic, logged immediately
    pub fn warning(message: impl Into<String>, location: Option<Location>) -> Self {
        Self::new(Severity::Warning, message, location).logged()
    }

    /// Emit the diagnostic through `tracing` and return it
    pub fn logged(self) -> Self {
        let location = self
            .location
            .as_ref()
            .map(|l| l.to_string())
            .unwrap_or_default();
        match self.severity {
            Severity::Info => tracing::info!(location = %location, "{}", self.message),
            Severity::Warning => tracing::warn!(location = %location, "{}", self.message),
            Severity::Error | Severity::Severe => {
                tracing::error!(location = %location, "{}", self.message)
            }
        }
        self
    }
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: {}: {}", location, self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_location() {
        let w = BuildWarning::new(
            Severity::Warning,
            "TODO entry found: fix X",
            Some(Location::new("a.tdoc", Some(10))),
        );
        assert_eq!(w.to_string(), "a.tdoc:10: WARNING: TODO entry found: fix X");
    }

    #[test]
    fn test_display_without_location() {
        let w = BuildWarning::new(Severity::Error, "boom", None);
        assert_eq!(w.to_string(), "ERROR: boom");
    }

    #[test]
    fn test_severity_levels_order() {
        assert!(Severity::Error > Severity::Warning);
        assert_eq!(Severity::Error.level(), 3);
    }
}
