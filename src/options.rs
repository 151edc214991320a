use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::Error;

/// Syntax highlighting callback: `(code, lang) -> markup`.
///
/// Returning `None` keeps the raw code.
pub type Highlighter = Arc<dyn Fn(&str, &str) -> Option<String> + Send + Sync>;

/// Configuration for parsing and rendering.
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Highlighter for fenced code blocks (code only, never read from config)
    #[serde(skip)]
    pub highlight: Option<Highlighter>,
    /// Prefix for the language class of fenced code blocks (default: "language-")
    pub lang_prefix: String,
    /// Render soft line breaks as `br` elements
    pub breaks: bool,
    /// Indent level the renderer starts at
    pub initial_indent: usize,
    /// Maximum rule nesting depth for both block and inline chains
    pub max_nesting: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            highlight: None,
            lang_prefix: "language-".to_string(),
            breaks: false,
            initial_indent: 0,
            max_nesting: 100,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("highlight", &self.highlight.as_ref().map(|_| "<fn>"))
            .field("lang_prefix", &self.lang_prefix)
            .field("breaks", &self.breaks)
            .field("initial_indent", &self.initial_indent)
            .field("max_nesting", &self.max_nesting)
            .finish()
    }
}

impl Options {
    /// Parse options from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        toml::from_str(text).map_err(|source| Error::Config { path: None, source })
    }

    /// Load options from a TOML file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        toml::from_str(&text).map_err(|source| Error::Config {
            path: Some(path.to_path_buf()),
            source,
        })
    }

    pub fn with_highlighter<F>(mut self, highlight: F) -> Self
    where
        F: Fn(&str, &str) -> Option<String> + Send + Sync + 'static,
    {
        self.highlight = Some(Arc::new(highlight));
        self
    }
}
