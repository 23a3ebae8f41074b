//! Output formats and the addresses they can give to document locations

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when an output format cannot address a location in another document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no URI available for target")]
pub struct NoUri;

/// Supported output formats
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Html,
    Latex,
    Text,
    Man,
    Texinfo,
}

impl OutputFormat {
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Latex => "latex",
            OutputFormat::Text => "text",
            OutputFormat::Man => "man",
            OutputFormat::Texinfo => "texinfo",
        }
    }

    /// File suffix of written documents
    pub fn suffix(self) -> &'static str {
        match self {
            OutputFormat::Html => ".html",
            OutputFormat::Latex => ".tex",
            OutputFormat::Text => ".txt",
            OutputFormat::Man => ".1",
            OutputFormat::Texinfo => ".texi",
        }
    }

    /// Address of a document, as seen from the output root
    pub fn get_target_uri(self, docname: &str) -> Result<String, NoUri> {
        match self {
            OutputFormat::Html => Ok(format!("{}{}", docname, self.suffix())),
            // all LaTeX and Texinfo documents share one label namespace
            OutputFormat::Latex | OutputFormat::Texinfo => Ok(format!("%{}", docname)),
            OutputFormat::Text | OutputFormat::Man => Err(NoUri),
        }
    }

    /// Address of `to` as seen from the document `from`
    pub fn get_relative_uri(self, from: &str, to: &str) -> Result<String, NoUri> {
        let target = self.get_target_uri(to)?;
        match self {
            OutputFormat::Html => Ok(relative_uri(&self.get_target_uri(from)?, &target)),
            _ => Ok(target),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" => Ok(OutputFormat::Html),
            "latex" => Ok(OutputFormat::Latex),
            "text" => Ok(OutputFormat::Text),
            "man" => Ok(OutputFormat::Man),
            "texinfo" => Ok(OutputFormat::Texinfo),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// Relative URI from `base` to `to`, both given relative to the output root
pub fn relative_uri(base: &str, to: &str) -> String {
    if to.starts_with('/') {
        return to.to_string();
    }
    let mut b2: Vec<&str> = base.split('/').collect();
    let mut t2: Vec<&str> = to.split('/').collect();
    // drop the shared leading directories
    while b2.len() > 1 && t2.len() > 1 && b2[0] == t2[0] {
        b2.remove(0);
        t2.remove(0);
    }
    if b2 == t2 {
        return String::new();
    }
    if b2.len() == 1 && t2 == [""] {
        return "./".to_string();
    }
    format!("{}{}", "../".repeat(b2.len() - 1), t2.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_uri_same_directory() {
        assert_eq!(relative_uri("a.html", "b.html"), "b.html");
    }

    #[test]
    fn test_relative_uri_up_and_down() {
        assert_eq!(relative_uri("guide/a.html", "b.html"), "../b.html");
        assert_eq!(relative_uri("a.html", "guide/b.html"), "guide/b.html");
        assert_eq!(relative_uri("guide/a.html", "guide/b.html"), "b.html");
        assert_eq!(relative_uri("x/y/a.html", "x/z/b.html"), "../z/b.html");
    }

    #[test]
    fn test_relative_uri_same_file() {
        assert_eq!(relative_uri("a.html", "a.html"), "");
    }

    #[test]
    fn test_html_uris() {
        let html = OutputFormat::Html;
        assert_eq!(html.get_target_uri("guide/a"), Ok("guide/a.html".to_string()));
        assert_eq!(html.get_relative_uri("guide/a", "b"), Ok("../b.html".to_string()));
    }

    #[test]
    fn test_latex_uris() {
        assert_eq!(OutputFormat::Latex.get_relative_uri("a", "b"), Ok("%b".to_string()));
    }

    #[test]
    fn test_texinfo_uris() {
        let texinfo = OutputFormat::Texinfo;
        assert_eq!(texinfo.get_relative_uri("guide/a", "b"), Ok("%b".to_string()));
        assert_eq!(texinfo.suffix(), ".texi");
        assert_eq!("texinfo".parse::<OutputFormat>(), Ok(texinfo));
    }

    #[test]
    fn test_text_and_man_have_no_uris() {
        assert_eq!(OutputFormat::Text.get_relative_uri("a", "b"), Err(NoUri));
        assert_eq!(OutputFormat::Man.get_target_uri("a"), Err(NoUri));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("man".parse::<OutputFormat>(), Ok(OutputFormat::Man));
        assert!("pdf".parse::<OutputFormat>().is_err());
    }
}
