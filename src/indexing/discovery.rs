use crate::core::error::{Error, Result};
use globset::{GlobBuilder, GlobMatcher};
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Compile a root-relative glob. `*` stays inside one path segment,
/// `**` crosses directories.
fn compile_pattern(pattern: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| Error::Pattern(format!("{}: {}", pattern, e)))
}

/// Directory part of `pattern` before the first glob metacharacter.
/// The walk for the pattern starts there.
fn literal_prefix(pattern: &str) -> PathBuf {
    let mut components: Vec<&str> = pattern.split('/').collect();
    components.pop();
    components
        .into_iter()
        .take_while(|c| !c.contains(['*', '?', '[', '{']))
        .filter(|c| !c.is_empty())
        .collect()
}

/// Files under `root/prefix` whose root-relative path matches `matcher`
fn walk_matching(root: &Path, prefix: &Path, matcher: &GlobMatcher) -> Vec<PathBuf> {
    let start = if prefix.as_os_str().is_empty() {
        root.to_path_buf()
    } else {
        root.join(prefix)
    };
    if !start.is_dir() {
        return Vec::new();
    }

    // Every file a pattern names is listed, ignored by git or not
    let walker = WalkBuilder::new(&start)
        .standard_filters(false)
        .build();

    let mut files = Vec::new();
    for result in walker {
        match result {
            Ok(entry) => {
                if !entry.file_type().is_some_and(|t| t.is_file()) {
                    continue;
                }

                let path = entry.path();
                let relative = path.strip_prefix(root).unwrap_or(path);
                if matcher.is_match(relative) {
                    files.push(path.to_path_buf());
                }
            }
            Err(err) => {
                // Some files might be inaccessible; the walk continues
                tracing::warn!("Failed to access file: {}", err);
            }
        }
    }

    files
}

/// Discover files under `root` matching any of `patterns`
///
/// Each pattern is walked from its literal directory prefix, so
/// `lib/tasks/**/*.rake` never visits the rest of the project. Each file
/// is listed once, under the first pattern that matches it. Groups follow
/// pattern order and are sorted within.
pub fn discover_files(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(Error::Config(format!(
            "Directory does not exist: {}",
            root.display()
        )));
    }

    if !root.is_dir() {
        return Err(Error::Config(format!(
            "Path is not a directory: {}",
            root.display()
        )));
    }

    let matchers = patterns
        .iter()
        .map(|p| compile_pattern(p))
        .collect::<Result<Vec<_>>>()?;

    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for (pattern, matcher) in patterns.iter().zip(&matchers) {
        let mut group = walk_matching(root, &literal_prefix(pattern), matcher);
        group.sort();
        group.retain(|path| seen.insert(path.clone()));
        files.extend(group);
    }

    tracing::debug!("Discovered {} files under {}", files.len(), root.display());
    Ok(files)
}
