use crate::core::config::Config;
use crate::core::error::Result;
use crate::indexing::annotations::AnnotationExtractor;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;

static DESC_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*desc\s+['"]"#).expect("static regex"));
static EXTENDED_DESC_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*zen_desc\s+").expect("static regex"));
static COMMENT_OR_BLANK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(#|$)").expect("static regex"));
static TASK_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*task\s+[:'"]?(\w+)"#).expect("static regex"));

/// Lines after a `desc` searched for the task it documents
const TASK_LOOKAHEAD: usize = 3;

/// A described task with no annotations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintWarning {
    pub file: PathBuf,
    /// 1-based line of the `desc`
    pub line: usize,
    pub task_name: String,
}

/// Finds tasks whose description is not accompanied by tag comments
pub struct Linter {
    annotations: AnnotationExtractor,
}

impl Linter {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            annotations: AnnotationExtractor::new(config)?,
        })
    }

    /// Check every file; invalid UTF-8 is replaced, unreadable files are an error
    pub fn run(&self, files: &[PathBuf]) -> Result<Vec<LintWarning>> {
        let mut warnings = Vec::new();
        for file in files {
            let bytes = std::fs::read(file)?;
            let content = String::from_utf8_lossy(&bytes);
            warnings.extend(self.check_content(&content, file));
        }
        Ok(warnings)
    }

    pub fn check_content(&self, content: &str, file: &Path) -> Vec<LintWarning> {
        let lines: Vec<&str> = content.lines().collect();
        let mut warnings = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            if !DESC_LINE.is_match(line) || self.preceded_by_tags(&lines, index) {
                continue;
            }

            if let Some(task_name) = next_task_name(&lines, index) {
                warnings.push(LintWarning {
                    file: file.to_path_buf(),
                    line: index + 1,
                    task_name,
                });
            }
        }

        warnings
    }

    /// Walk back over the comment/blank block above `desc_index`
    fn preceded_by_tags(&self, lines: &[&str], desc_index: usize) -> bool {
        for line in lines[..desc_index].iter().rev() {
            if self.annotations.is_tag_line(line) || EXTENDED_DESC_LINE.is_match(line) {
                return true;
            }
            if !COMMENT_OR_BLANK.is_match(line) {
                break;
            }
        }
        false
    }
}

fn next_task_name(lines: &[&str], desc_index: usize) -> Option<String> {
    let end = (desc_index + 1 + TASK_LOOKAHEAD).min(lines.len());
    lines
        .get(desc_index + 1..end)?
        .iter()
        .find_map(|line| TASK_NAME.captures(line).map(|c| c[1].to_string()))
}

/// `.rake` files touched by the last commit, relative paths resolved
/// against `root`. Empty when git is unavailable.
pub fn changed_files(root: &Path) -> Vec<PathBuf> {
    let output = Command::new("git")
        .args(["diff", "--name-only", "--diff-filter=ACMR", "HEAD~1"])
        .current_dir(root)
        .output();

    let output = match output {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            tracing::warn!("git diff exited with {}", output.status);
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!("Failed to run git: {}", e);
            return Vec::new();
        }
    };

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|name| name.ends_with(".rake"))
        .map(|name| root.join(name))
        .filter(|path| path.exists())
        .collect()
}
