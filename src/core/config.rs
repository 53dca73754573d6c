use super::error::{Error, Result};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Annotation tag used when none is configured (`# @zen team: search`)
pub const DEFAULT_TAG: &str = "zen";

/// Patterns scanned when no override is configured
pub const DEFAULT_GLOB_PATTERNS: &[&str] = &["lib/tasks/**/*.rake"];

/// Cache location, relative to the scanned root
pub const CACHE_RELATIVE_PATH: &str = "tmp/zen_apropos_index.cache";

/// Configuration for zen-apropos
///
/// Built once before the first scan and passed by reference to the
/// components that need it. Nothing reads process-wide state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the glob patterns are rooted at
    pub root: PathBuf,
    /// Annotation tag (the `zen` in `# @zen team: search`)
    pub tag: String,
    /// Glob pattern override; `None` means [`DEFAULT_GLOB_PATTERNS`]
    pub glob_patterns: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            tag: DEFAULT_TAG.to_string(),
            glob_patterns: None,
        }
    }
}

impl Config {
    /// Create a configuration rooted at `root` with default tag and patterns
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_glob_patterns(mut self, patterns: Vec<String>) -> Self {
        self.glob_patterns = Some(patterns);
        self
    }

    /// Check the configuration before any scan uses it
    pub fn validate(&self) -> Result<()> {
        if self.tag.trim().is_empty() {
            return Err(Error::Config("Annotation tag must not be empty".to_string()));
        }

        if let Some(patterns) = &self.glob_patterns {
            if patterns.is_empty() {
                return Err(Error::Config(
                    "Glob pattern override must contain at least one pattern".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Effective glob patterns (override or defaults)
    pub fn patterns(&self) -> Vec<String> {
        match &self.glob_patterns {
            Some(patterns) => patterns.clone(),
            None => DEFAULT_GLOB_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Matcher for annotation lines: `^\s*#\s*@<tag>\s+`
    pub fn tag_pattern(&self) -> Result<Regex> {
        let pattern = format!(r"^\s*#\s*@{}\s+", regex::escape(&self.tag));
        Regex::new(&pattern)
            .map_err(|e| Error::Config(format!("Invalid annotation tag {:?}: {}", self.tag, e)))
    }

    /// Location of the persisted index for this root
    pub fn cache_path(&self) -> PathBuf {
        self.root.join(CACHE_RELATIVE_PATH)
    }
}
