use crate::core::config::Config;
use crate::core::entry::Entry;
use crate::core::error::Result;
use crate::indexing::source::{RakeSource, TaskSource};
use crate::search::grouper::{Dimension, Group, ResultGrouper, MIN_RESULTS_FOR_GROUPING};
use crate::search::query::{FilterKey, Query};
use crate::storage::index::Index;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Source lines around the first free-text hit inside a task's source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchContext {
    /// `(line number, line text)` pairs, at most three, in file order
    pub lines: Vec<(usize, String)>,
    pub matched_line: usize,
}

/// Everything a formatter needs to render one search
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub query: String,
    /// Matching entries in index order
    pub results: Vec<Entry>,
    pub groups: Vec<Group>,
    /// Set only when the results were large enough to be grouped
    pub group_dimension: Option<Dimension>,
    /// Keyed by declaration site; task names may repeat across files
    pub matches: BTreeMap<(PathBuf, usize), MatchContext>,
    pub elapsed: Duration,
}

impl SearchOutcome {
    /// Results in display order (groups flattened), matching the numbering
    /// a formatter shows
    pub fn ordered(&self) -> Vec<&Entry> {
        self.groups.iter().flat_map(|g| g.entries.iter()).collect()
    }

    /// Source context recorded for `entry`, if it matched only in its source
    pub fn context_for(&self, entry: &Entry) -> Option<&MatchContext> {
        self.matches.get(&location(entry))
    }
}

/// Parses queries, filters the index and groups the results
pub struct Engine<S: TaskSource = RakeSource> {
    index: Index<S>,
}

impl Engine<RakeSource> {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_source(RakeSource::new(config)?))
    }
}

impl<S: TaskSource> Engine<S> {
    pub fn with_source(source: S) -> Self {
        Self {
            index: Index::new(source),
        }
    }

    pub fn index(&self) -> &Index<S> {
        &self.index
    }

    pub fn search(&self, raw_query: &str) -> Result<SearchOutcome> {
        let started = Instant::now();

        let query = Query::parse(raw_query);
        let results = self.find_entries(&query)?;
        let matches = build_match_context(&results, &query.text);

        let grouper = ResultGrouper::new(&results, &query.filters);
        let groups = grouper.group();
        let group_dimension =
            (results.len() >= MIN_RESULTS_FOR_GROUPING).then(|| grouper.best_dimension());

        tracing::debug!(
            "Query {:?}: {} results in {} groups",
            raw_query,
            results.len(),
            groups.len()
        );

        Ok(SearchOutcome {
            query: raw_query.to_string(),
            results,
            groups,
            group_dimension,
            matches,
            elapsed: started.elapsed(),
        })
    }

    /// Filtered entries only, without grouping
    pub fn search_entries(&self, raw_query: &str) -> Result<Vec<Entry>> {
        self.find_entries(&Query::parse(raw_query))
    }

    fn find_entries(&self, query: &Query) -> Result<Vec<Entry>> {
        Ok(self
            .index
            .entries()?
            .into_iter()
            .filter(|e| matches_filters(e, &query.filters))
            .filter(|e| matches_text(e, &query.text))
            .collect())
    }

    pub fn help(&self) -> &'static str {
        HELP
    }
}

const HELP: &str = "
ZenApropos - Rake Task Search

Usage:
  zen-apropos <query> [--plain]
  zen-apropos lint [--changed-only]

Query Syntax:
  Free text      Search task names, descriptions, annotations, and source
  team:<name>    Filter by team annotation
  safety:<level> Filter by safety level (safe, caution, destructive)
  namespace:<ns> Filter by rake namespace
  keyword:<word> Filter by declared keyword

Examples:
  zen-apropos employee
  zen-apropos reindex
  zen-apropos namespace:indexer
  zen-apropos \"team:finance safety:destructive\"
  zen-apropos Employee.find_each
  zen-apropos reindex --plain
";

fn eq_ignore_case(value: Option<&str>, expected: &str) -> bool {
    value.is_some_and(|v| v.to_lowercase() == expected.to_lowercase())
}

/// Every filter must hold
fn matches_filters(entry: &Entry, filters: &BTreeMap<FilterKey, String>) -> bool {
    filters.iter().all(|(key, value)| match key {
        FilterKey::Team => eq_ignore_case(entry.team(), value),
        FilterKey::Safety => eq_ignore_case(entry.safety(), value),
        FilterKey::Namespace => eq_ignore_case(Some(entry.namespace.as_str()), value),
        FilterKey::Keyword => entry
            .keywords()
            .iter()
            .any(|k| eq_ignore_case(Some(k.as_str()), value)),
    })
}

/// Case-insensitive substring over name, description, keywords and source
fn matches_text(entry: &Entry, text: &str) -> bool {
    if text.is_empty() {
        return true;
    }

    let needle = text.to_lowercase();
    entry.name.to_lowercase().contains(&needle)
        || entry.description.to_lowercase().contains(&needle)
        || entry
            .keywords()
            .iter()
            .any(|k| k.to_lowercase().contains(&needle))
        || entry.source.to_lowercase().contains(&needle)
}

fn location(entry: &Entry) -> (PathBuf, usize) {
    (entry.file_path.clone(), entry.line_number)
}

/// Context for entries that matched only inside their source
fn build_match_context(
    entries: &[Entry],
    text: &str,
) -> BTreeMap<(PathBuf, usize), MatchContext> {
    let mut context = BTreeMap::new();
    if text.is_empty() {
        return context;
    }

    let needle = text.to_lowercase();
    for entry in entries {
        if entry.name.to_lowercase().contains(&needle)
            || entry.description.to_lowercase().contains(&needle)
        {
            continue;
        }

        let lines: Vec<&str> = entry.source.lines().collect();
        let Some(hit) = lines.iter().position(|l| l.to_lowercase().contains(&needle)) else {
            continue;
        };

        let first = hit.saturating_sub(1);
        let last = (hit + 1).min(lines.len() - 1);
        let matched_line = entry.line_number + hit;

        context.insert(
            location(entry),
            MatchContext {
                lines: (first..=last)
                    .map(|i| (entry.line_number + i, lines[i].to_string()))
                    .collect(),
                matched_line,
            },
        );
    }

    context
}
