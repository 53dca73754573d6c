use crate::core::config::Config;
use crate::core::entry::Entry;
use crate::core::error::Result;
use crate::indexing::discovery::discover_files;
use crate::indexing::extractor::TaskExtractor;
use std::path::{Path, PathBuf};

/// A provider of indexable task entries
///
/// `scan` lists the files the provider reads; `entries` parses them.
/// The index uses `root` and `glob_patterns` to locate and key its cache.
pub trait TaskSource {
    /// Directory the provider scans
    fn root(&self) -> &Path;

    /// Patterns that select the scanned files
    fn glob_patterns(&self) -> &[String];

    /// Any other setting that changes what `parse` produces. A cached
    /// index built under a different key is discarded.
    fn cache_key(&self) -> String {
        String::new()
    }

    /// Files to process, in deterministic order
    fn scan(&self) -> Result<Vec<PathBuf>>;

    /// Entries of a single file
    fn parse(&self, path: &Path) -> Result<Vec<Entry>>;

    /// Entries of every scanned file, in file order
    fn entries(&self) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        for file in self.scan()? {
            entries.extend(self.parse(&file)?);
        }
        Ok(entries)
    }
}

/// Scans `.rake` files into entries
#[derive(Debug, Clone)]
pub struct RakeSource {
    root: PathBuf,
    glob_patterns: Vec<String>,
    tag: String,
    extractor: TaskExtractor,
}

impl RakeSource {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            root: config.root.clone(),
            glob_patterns: config.patterns(),
            tag: config.tag.clone(),
            extractor: TaskExtractor::new(config)?,
        })
    }
}

impl TaskSource for RakeSource {
    fn root(&self) -> &Path {
        &self.root
    }

    fn glob_patterns(&self) -> &[String] {
        &self.glob_patterns
    }

    fn cache_key(&self) -> String {
        format!("tag={}", self.tag)
    }

    fn scan(&self) -> Result<Vec<PathBuf>> {
        discover_files(&self.root, &self.glob_patterns)
    }

    fn parse(&self, path: &Path) -> Result<Vec<Entry>> {
        self.extractor.extract_file(path)
    }
}
