use crate::core::config::Config;
use crate::core::entry::Annotations;
use crate::core::error::{Error, Result};
use regex::Regex;

/// Parses tag comment lines that precede a task definition
///
/// ```text
/// # @zen team: hr-platform
/// # @zen safety: caution
/// # @zen keywords: sync, external, api
/// ```
#[derive(Debug, Clone)]
pub struct AnnotationExtractor {
    tag_pattern: Regex,
    /// `@<tag> <key>: <value>`, built from the same escaped tag
    key_value: Regex,
}

impl AnnotationExtractor {
    pub fn new(config: &Config) -> Result<Self> {
        let key_value = format!(r"@{}\s+(\w+):\s*(.+)$", regex::escape(&config.tag));
        let key_value = Regex::new(&key_value)
            .map_err(|e| Error::Config(format!("Invalid annotation tag {:?}: {}", config.tag, e)))?;

        Ok(Self {
            tag_pattern: config.tag_pattern()?,
            key_value,
        })
    }

    /// Whether `line` is an annotation line for the configured tag
    pub fn is_tag_line(&self, line: &str) -> bool {
        self.tag_pattern.is_match(line)
    }

    /// Collect annotations from `lines`; later keys overwrite earlier ones
    pub fn parse<S: AsRef<str>>(&self, lines: &[S]) -> Annotations {
        let mut annotations = Annotations::default();

        for line in lines {
            let line = line.as_ref().trim_end_matches(['\n', '\r']);
            if !self.is_tag_line(line) {
                continue;
            }

            if let Some(caps) = self.key_value.captures(line) {
                let key = caps[1].trim();
                let value = caps[2].trim();
                annotations.set(key, value);
            }
        }

        annotations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> AnnotationExtractor {
        AnnotationExtractor::new(&Config::new("/app")).unwrap()
    }

    #[test]
    fn test_parses_team() {
        let result = extractor().parse(&["  # @zen team: hr-platform\n"]);
        assert_eq!(result.team.as_deref(), Some("hr-platform"));
    }

    #[test]
    fn test_parses_safety() {
        let result = extractor().parse(&["  # @zen safety: caution\n"]);
        assert_eq!(result.safety.as_deref(), Some("caution"));
    }

    #[test]
    fn test_parses_keywords() {
        let result = extractor().parse(&["  # @zen keywords: sync, permissions, api\n"]);
        assert_eq!(
            result.keywords,
            Some(vec!["sync".to_string(), "permissions".to_string(), "api".to_string()])
        );
    }

    #[test]
    fn test_parses_multiple_annotations() {
        let lines = [
            "  # @zen team: search\n",
            "  # @zen safety: safe\n",
            "  # @zen keywords: elasticsearch, reindex\n",
        ];
        let result = extractor().parse(&lines);

        assert_eq!(result.team.as_deref(), Some("search"));
        assert_eq!(result.safety.as_deref(), Some("safe"));
        assert_eq!(
            result.keywords,
            Some(vec!["elasticsearch".to_string(), "reindex".to_string()])
        );
    }

    #[test]
    fn test_last_occurrence_wins() {
        let lines = ["# @zen team: first", "# @zen team: second"];
        let result = extractor().parse(&lines);
        assert_eq!(result.team.as_deref(), Some("second"));
    }

    #[test]
    fn test_unknown_keys_are_kept() {
        let result = extractor().parse(&["# @zen owner: platform-oncall"]);
        assert_eq!(result.get("owner"), Some("platform-oncall"));
    }

    #[test]
    fn test_ignores_non_tag_comments() {
        let lines = ["  # This is a regular comment\n", "  # @other team: nope\n"];
        assert!(extractor().parse(&lines).is_empty());
    }

    #[test]
    fn test_empty_lines() {
        let lines: [&str; 0] = [];
        assert!(extractor().parse(&lines).is_empty());
    }

    #[test]
    fn test_custom_tag() {
        let config = Config::new("/app").with_tag("myapp");
        let extractor = AnnotationExtractor::new(&config).unwrap();

        let result = extractor.parse(&["# @myapp team: core", "# @zen team: ignored"]);
        assert_eq!(result.team.as_deref(), Some("core"));
    }

    #[test]
    fn test_tag_with_punctuation() {
        for tag in ["my-app", "a.b"] {
            let extractor = AnnotationExtractor::new(&Config::new("/app").with_tag(tag)).unwrap();
            let line = format!("  # @{} team: platform", tag);

            let result = extractor.parse(&[line.as_str()]);
            assert_eq!(result.team.as_deref(), Some("platform"), "tag {}", tag);
        }
    }
}
