use crate::core::entry::Entry;
use crate::search::query::FilterKey;
use std::collections::BTreeMap;
use std::fmt;

/// Below this many results everything stays in one group
pub const MIN_RESULTS_FOR_GROUPING: usize = 5;

/// A dimension results can be grouped along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Namespace,
    Team,
    Safety,
}

impl Dimension {
    /// Candidates in preference order
    pub const ALL: [Dimension; 3] = [Dimension::Namespace, Dimension::Team, Dimension::Safety];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Namespace => "namespace",
            Dimension::Team => "team",
            Dimension::Safety => "safety",
        }
    }

    /// The filter that pins this dimension to a single value
    fn filter_key(&self) -> FilterKey {
        match self {
            Dimension::Namespace => FilterKey::Namespace,
            Dimension::Team => FilterKey::Team,
            Dimension::Safety => FilterKey::Safety,
        }
    }

    /// Value of this dimension for `entry`; empty values count as missing
    pub fn value<'a>(&self, entry: &'a Entry) -> Option<&'a str> {
        let value = match self {
            Dimension::Namespace => Some(entry.namespace.as_str()),
            Dimension::Team => entry.team(),
            Dimension::Safety => entry.safety(),
        };
        value.filter(|v| !v.is_empty())
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One group of results. `key` is `None` for the ungrouped bucket and
/// for entries lacking a value along the chosen dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub key: Option<String>,
    pub entries: Vec<Entry>,
}

impl Group {
    pub fn label(&self) -> &str {
        self.key.as_deref().unwrap_or("(none)")
    }
}

/// Picks the most informative dimension and partitions results by it
pub struct ResultGrouper<'a> {
    entries: &'a [Entry],
    active_filters: &'a BTreeMap<FilterKey, String>,
}

impl<'a> ResultGrouper<'a> {
    pub fn new(entries: &'a [Entry], active_filters: &'a BTreeMap<FilterKey, String>) -> Self {
        Self {
            entries,
            active_filters,
        }
    }

    /// Groups ordered by descending size; equal sizes keep first-seen order
    pub fn group(&self) -> Vec<Group> {
        if self.entries.len() < MIN_RESULTS_FOR_GROUPING {
            return vec![Group {
                key: None,
                entries: self.entries.to_vec(),
            }];
        }

        let dimension = self.best_dimension();
        let mut groups: Vec<Group> = Vec::new();

        for entry in self.entries {
            let key = dimension.value(entry);
            match groups.iter_mut().find(|g| g.key.as_deref() == key) {
                Some(group) => group.entries.push(entry.clone()),
                None => groups.push(Group {
                    key: key.map(str::to_string),
                    entries: vec![entry.clone()],
                }),
            }
        }

        // Stable sort keeps first-seen order among equal sizes
        groups.sort_by(|a, b| b.entries.len().cmp(&a.entries.len()));
        groups
    }

    /// The candidate dimension with the best cluster distribution
    ///
    /// Dimensions pinned by a filter are skipped. Falls back to namespace
    /// when nothing scores above zero.
    pub fn best_dimension(&self) -> Dimension {
        let candidates: Vec<Dimension> = Dimension::ALL
            .into_iter()
            .filter(|d| !self.active_filters.contains_key(&d.filter_key()))
            .collect();

        let mut best: Option<(Dimension, f64)> = None;
        for &dimension in &candidates {
            let score = self.grouping_score(dimension);
            if score > best.map_or(0.0, |(_, s)| s) {
                best = Some((dimension, score));
            }
        }

        match best {
            Some((dimension, _)) => dimension,
            None if candidates.is_empty() || candidates.contains(&Dimension::Namespace) => {
                Dimension::Namespace
            }
            None => candidates[0],
        }
    }

    /// `groups / entries`, or zero when grouping would be useless
    /// (everything in one group, or every entry alone)
    fn grouping_score(&self, dimension: Dimension) -> f64 {
        let mut distinct: Vec<Option<&str>> = Vec::new();
        for entry in self.entries {
            let value = dimension.value(entry);
            if !distinct.contains(&value) {
                distinct.push(value);
            }
        }

        if distinct.len() <= 1 || distinct.len() == self.entries.len() {
            return 0.0;
        }

        distinct.len() as f64 / self.entries.len() as f64
    }
}
