//! Configuration for document writers

/// Options shared by every writer
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Wrap output in a complete document (HTML page, LaTeX document, man header)
    pub standalone: bool,

    /// Document title used by standalone output
    pub title: Option<String>,

    /// Column width for wrapped text output
    pub text_width: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            standalone: false,
            title: None,
            text_width: 72,
        }
    }
}

impl WriterConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether output is standalone
    pub fn with_standalone(mut self, standalone: bool) -> Self {
        self.standalone = standalone;
        self
    }

    /// Set the document title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the text column width
    pub fn with_text_width(mut self, width: usize) -> Self {
        self.text_width = width;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WriterConfig::default();
        assert!(!config.standalone);
        assert!(config.title.is_none());
        assert_eq!(config.text_width, 72);
    }

    #[test]
    fn test_builder_pattern() {
        let config = WriterConfig::new()
            .with_standalone(true)
            .with_title("Handbook")
            .with_text_width(60);
        assert!(config.standalone);
        assert_eq!(config.title.as_deref(), Some("Handbook"));
        assert_eq!(config.text_width, 60);
    }
}
