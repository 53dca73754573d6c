use crate::core::config::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// zen-apropos - Search rake tasks by name, description, annotations and source
#[derive(Parser, Debug)]
#[command(name = "zen-apropos")]
#[command(about = "Search rake tasks by name, description, annotations and source", long_about = None)]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Search query: free text and team:/safety:/namespace:/keyword: filters
    #[arg(value_name = "QUERY")]
    pub query: Vec<String>,

    /// Pipeable output, one tab-aligned line per task
    #[arg(long)]
    pub plain: bool,

    /// Project root the glob patterns are relative to (default: current directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Annotation tag, the `zen` in `# @zen team: search`
    #[arg(long, global = true)]
    pub tag: Option<String>,

    /// Glob pattern selecting task files; repeat for several
    #[arg(long = "glob", value_name = "PATTERN", global = true)]
    pub glob_patterns: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report described tasks that carry no annotations
    Lint {
        /// Only check .rake files changed in the last commit
        #[arg(long)]
        changed_only: bool,
    },
}

impl Cli {
    /// Joined query words; `None` when no query was given
    pub fn query_text(&self) -> Option<String> {
        let text = self.query.join(" ");
        (!text.trim().is_empty()).then_some(text)
    }

    /// Build the search configuration from the flags
    pub fn config(&self) -> Config {
        let mut config = match &self.root {
            Some(root) => Config::new(root),
            None => Config::default(),
        };
        if let Some(tag) = &self.tag {
            config = config.with_tag(tag.clone());
        }
        if !self.glob_patterns.is_empty() {
            config = config.with_glob_patterns(self.glob_patterns.clone());
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_words_are_joined() {
        let cli = Cli::parse_from(["zen-apropos", "reindex", "team:search", "--plain"]);
        assert_eq!(cli.query_text().as_deref(), Some("reindex team:search"));
        assert!(cli.plain);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_no_query() {
        let cli = Cli::parse_from(["zen-apropos"]);
        assert_eq!(cli.query_text(), None);
    }

    #[test]
    fn test_config_from_flags() {
        let cli = Cli::parse_from([
            "zen-apropos",
            "--root",
            "/app",
            "--tag",
            "myapp",
            "--glob",
            "lib/tasks/*.rake",
            "--glob",
            "ops/**/*.rake",
            "backup",
        ]);
        let config = cli.config();

        assert_eq!(config.root, PathBuf::from("/app"));
        assert_eq!(config.tag, "myapp");
        assert_eq!(
            config.patterns(),
            vec!["lib/tasks/*.rake".to_string(), "ops/**/*.rake".to_string()]
        );
    }

    #[test]
    fn test_lint_subcommand() {
        let cli = Cli::parse_from(["zen-apropos", "lint", "--changed-only"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Lint { changed_only: true })
        ));
    }
}
