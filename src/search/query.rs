use std::collections::BTreeMap;
use std::fmt;

/// Structured filter keys recognised in a query (`team:search`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterKey {
    Team,
    Safety,
    Namespace,
    Keyword,
}

impl FilterKey {
    pub const ALL: [FilterKey; 4] = [
        FilterKey::Team,
        FilterKey::Safety,
        FilterKey::Namespace,
        FilterKey::Keyword,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKey::Team => "team",
            FilterKey::Safety => "safety",
            FilterKey::Namespace => "namespace",
            FilterKey::Keyword => "keyword",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed query: free text plus structured filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub text: String,
    pub filters: BTreeMap<FilterKey, String>,
}

impl Query {
    /// Split a raw query into filters and free text
    ///
    /// ```
    /// use zen_apropos::search::query::{FilterKey, Query};
    ///
    /// let query = Query::parse("employee team:search");
    /// assert_eq!(query.text, "employee");
    /// assert_eq!(query.filters[&FilterKey::Team], "search");
    /// ```
    pub fn parse(raw: &str) -> Self {
        let mut query = Query::default();
        let mut text_parts = Vec::new();

        for token in raw.split_whitespace() {
            let filter = token.split_once(':').and_then(|(key, value)| {
                FilterKey::parse(key)
                    .filter(|_| !value.is_empty())
                    .map(|key| (key, value))
            });

            match filter {
                Some((key, value)) => {
                    query.filters.insert(key, value.to_string());
                }
                None => text_parts.push(token),
            }
        }

        query.text = text_parts.join(" ");
        query
    }

    /// Parse an optional query; `None` behaves like an empty string
    pub fn parse_opt(raw: Option<&str>) -> Self {
        raw.map(Self::parse).unwrap_or_default()
    }

    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_query() {
        for query in [Query::parse(""), Query::parse("   "), Query::parse_opt(None)] {
            assert_eq!(query.text, "");
            assert!(query.filters.is_empty());
        }
    }

    #[test]
    fn test_plain_text() {
        let query = Query::parse("employee");
        assert_eq!(query.text, "employee");
        assert!(query.filters.is_empty());
    }

    #[test]
    fn test_filters_only() {
        let query = Query::parse("team:finance safety:destructive");
        assert_eq!(query.text, "");
        assert_eq!(query.filters[&FilterKey::Team], "finance");
        assert_eq!(query.filters[&FilterKey::Safety], "destructive");
    }

    #[test]
    fn test_mixed_text_and_filters_preserve_order() {
        let query = Query::parse("sync  team:hr  permissions namespace:approvals now");
        assert_eq!(query.text, "sync permissions now");
        assert_eq!(query.filters[&FilterKey::Team], "hr");
        assert_eq!(query.filters[&FilterKey::Namespace], "approvals");
    }

    #[test]
    fn test_unknown_key_is_text() {
        let query = Query::parse("owner:alice Employee.find_each");
        assert_eq!(query.text, "owner:alice Employee.find_each");
        assert!(query.filters.is_empty());
    }

    #[test]
    fn test_empty_value_is_text() {
        let query = Query::parse("team:");
        assert_eq!(query.text, "team:");
        assert!(query.filters.is_empty());
    }

    #[test]
    fn test_value_keeps_later_colons() {
        let query = Query::parse("namespace:db:seed");
        assert_eq!(query.filters[&FilterKey::Namespace], "db:seed");
    }

    #[test]
    fn test_last_repeated_key_wins() {
        let query = Query::parse("keyword:a keyword:b");
        assert_eq!(query.filters[&FilterKey::Keyword], "b");
        assert_eq!(query.filters.len(), 1);
    }
}
