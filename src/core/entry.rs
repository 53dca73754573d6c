use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Metadata attached to a task through tag comments or the extended
/// description form
///
/// `team`, `safety` and `keywords` are the keys the search understands.
/// Any other tag key is kept in `extra` so custom tags survive indexing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Annotations {
    /// Store a raw `key: value` pair. `keywords` is split on commas.
    pub fn set(&mut self, key: &str, value: &str) {
        match key {
            "team" => self.team = Some(value.to_string()),
            "safety" => self.safety = Some(value.to_string()),
            "keywords" => self.keywords = Some(split_keywords(value)),
            _ => {
                self.extra.insert(key.to_string(), value.to_string());
            }
        }
    }

    /// Look up a single-valued annotation by key
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "team" => self.team.as_deref(),
            "safety" => self.safety.as_deref(),
            _ => self.extra.get(key).map(String::as_str),
        }
    }

    /// Overlay `other` on top of `self`; values present in `other` win
    pub fn merge(&mut self, other: Annotations) {
        if other.team.is_some() {
            self.team = other.team;
        }
        if other.safety.is_some() {
            self.safety = other.safety;
        }
        if other.keywords.is_some() {
            self.keywords = other.keywords;
        }
        self.extra.extend(other.extra);
    }

    pub fn is_empty(&self) -> bool {
        self.team.is_none()
            && self.safety.is_none()
            && self.keywords.is_none()
            && self.extra.is_empty()
    }
}

/// Split a comma separated keyword list, trimming each item
pub fn split_keywords(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// One indexed task definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Fully qualified task name, e.g. `indexer:employees`
    pub name: String,
    /// Namespace portion, e.g. `indexer`; empty for top-level tasks
    pub namespace: String,
    /// The `desc` string, empty when the task has none
    pub description: String,
    /// Absolute path of the file the task was found in
    pub file_path: PathBuf,
    /// 1-based line of the task declaration
    pub line_number: usize,
    /// Verbatim source of the task block
    pub source: String,
    pub annotations: Annotations,
    /// Declared argument names, e.g. `["days_ago"]`
    pub args: Vec<String>,
}

impl Entry {
    pub fn team(&self) -> Option<&str> {
        self.annotations.team.as_deref()
    }

    pub fn safety(&self) -> Option<&str> {
        self.annotations.safety.as_deref()
    }

    pub fn keywords(&self) -> &[String] {
        self.annotations.keywords.as_deref().unwrap_or(&[])
    }

    /// Command line that runs this task
    pub fn usage(&self) -> String {
        if self.args.is_empty() {
            format!("bundle exec rake {}", self.name)
        } else {
            format!("bundle exec rake {}[{}]", self.name, self.args.join(","))
        }
    }

    /// File path relative to `base`, or the full path when outside it
    pub fn relative_path(&self, base: &Path) -> PathBuf {
        self.file_path
            .strip_prefix(base)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| self.file_path.clone())
    }
}
