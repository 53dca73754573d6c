use crate::core::config::Config;
use crate::core::entry::{split_keywords, Annotations, Entry};
use crate::core::error::Result;
use crate::indexing::annotations::AnnotationExtractor;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static NAMESPACE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*namespace\s+[:'"](\w+)"#).expect("static regex"));
static BLOCK_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*end\s*$").expect("static regex"));
static DESC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*desc\s+['"](.*?)['"]"#).expect("static regex"));
static EXTENDED_DESC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*zen_desc\s+['"](.*?)['"]"#).expect("static regex"));
static TASK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*task\s+[:'"]?(\w+)"#).expect("static regex"));
static COMMENT_OR_BLANK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(#|$)").expect("static regex"));

// task :sync_updates, [:days_ago] => :environment
static TASK_ARGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([:\w,\s]+)\]\s*=>").expect("static regex"));
static ARG_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r":?(\w+)").expect("static regex"));

// Block delimiters counted when bounding a task's source
static STRING_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"'[^']*'|"[^"]*""#).expect("static regex"));
static BLOCK_OPENER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bdo\b|\{").expect("static regex"));
static BLOCK_CLOSER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bend\b|\}").expect("static regex"));

// Keyword arguments of the extended description form
static OPT_TEAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"team:\s*['"](.*?)['"]"#).expect("static regex"));
static OPT_SAFETY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"safety:\s*:?(\w+)").expect("static regex"));
static OPT_KEYWORDS_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"keywords:\s*%w\[([^\]]+)\]").expect("static regex"));
static OPT_KEYWORDS_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"keywords:\s*\[([^\]]+)\]").expect("static regex"));

/// Lines after an extended description searched for its keyword arguments
const EXTENDED_DESC_LOOKAHEAD: usize = 5;

/// Spaces of indentation per namespace nesting level
const INDENT_PER_LEVEL: usize = 2;

/// What a single line means to the scanner
#[derive(Debug, PartialEq)]
enum LineKind<'a> {
    Tag,
    NamespaceOpen(&'a str),
    BlockEnd { indent: usize },
    Description(&'a str),
    ExtendedDescription(&'a str),
    Task(&'a str),
    CommentOrBlank,
    Code,
}

/// Mutable state carried across lines of one file
#[derive(Debug, Default)]
struct ScanState<'a> {
    namespace_stack: Vec<&'a str>,
    pending_description: Option<String>,
    pending_annotations: Annotations,
    annotation_buffer: Vec<&'a str>,
}

impl ScanState<'_> {
    fn reset_pending(&mut self) {
        self.pending_description = None;
        self.pending_annotations = Annotations::default();
        self.annotation_buffer.clear();
    }

    fn namespace(&self) -> String {
        self.namespace_stack.join(":")
    }

    /// Close the innermost namespace if `indent` is at or left of where
    /// its `end` is expected. Assumes two spaces per nesting level.
    fn close_namespace(&mut self, indent: usize) {
        let depth = self.namespace_stack.len();
        if depth == 0 {
            return;
        }
        let expected = (depth - 1) * INDENT_PER_LEVEL;
        if indent <= expected {
            self.namespace_stack.pop();
        }
    }
}

/// Scans rake files line by line and rebuilds task records
///
/// Namespace nesting is tracked with an indentation heuristic, so files
/// that do not indent two spaces per level can be mis-attributed.
#[derive(Debug, Clone)]
pub struct TaskExtractor {
    annotations: AnnotationExtractor,
}

impl TaskExtractor {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            annotations: AnnotationExtractor::new(config)?,
        })
    }

    /// Read `path` and extract its tasks
    pub fn extract_file(&self, path: &Path) -> Result<Vec<Entry>> {
        let bytes = std::fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes);
        let lines: Vec<&str> = content.split_inclusive('\n').collect();

        let entries = self.extract(&lines, path);
        tracing::debug!("Extracted {} tasks from {}", entries.len(), path.display());
        Ok(entries)
    }

    /// Extract tasks from the lines of one file, in file order
    pub fn extract<'a>(&self, lines: &[&'a str], file_path: &Path) -> Vec<Entry> {
        let mut tasks = Vec::new();
        let mut state = ScanState::default();

        for (index, &line) in lines.iter().enumerate() {
            match self.classify(line) {
                LineKind::Tag => state.annotation_buffer.push(line),
                LineKind::NamespaceOpen(name) => state.namespace_stack.push(name),
                LineKind::BlockEnd { indent } if !state.namespace_stack.is_empty() => {
                    state.close_namespace(indent);
                }
                LineKind::Description(description) => {
                    state.pending_description = Some(description.to_string());
                    if !state.annotation_buffer.is_empty() {
                        state.pending_annotations =
                            self.annotations.parse(&state.annotation_buffer);
                    }
                }
                LineKind::ExtendedDescription(description) => {
                    state.pending_description = Some(description.to_string());
                    let mut annotations = parse_extended_options(lines, index);
                    if !state.annotation_buffer.is_empty() {
                        annotations.merge(self.annotations.parse(&state.annotation_buffer));
                    }
                    state.pending_annotations = annotations;
                }
                LineKind::Task(local_name) => {
                    let namespace = state.namespace();
                    let name = if namespace.is_empty() {
                        local_name.to_string()
                    } else {
                        format!("{}:{}", namespace, local_name)
                    };

                    tasks.push(Entry {
                        name,
                        namespace,
                        description: state.pending_description.take().unwrap_or_default(),
                        file_path: file_path.to_path_buf(),
                        line_number: index + 1,
                        source: extract_task_source(lines, index),
                        annotations: std::mem::take(&mut state.pending_annotations),
                        args: extract_task_args(line),
                    });

                    state.reset_pending();
                }
                LineKind::CommentOrBlank => {}
                // A stray `end` with no namespace open is ordinary code
                LineKind::BlockEnd { .. } | LineKind::Code => state.annotation_buffer.clear(),
            }
        }

        tasks
    }

    fn classify<'a>(&self, line: &'a str) -> LineKind<'a> {
        let text = line.trim_end_matches(['\n', '\r']);

        if self.annotations.is_tag_line(text) {
            return LineKind::Tag;
        }
        if let Some(caps) = NAMESPACE_OPEN.captures(text) {
            return LineKind::NamespaceOpen(capture(&caps, 1));
        }
        if BLOCK_END.is_match(text) {
            return LineKind::BlockEnd {
                indent: leading_whitespace(text),
            };
        }
        if let Some(caps) = DESC.captures(text) {
            return LineKind::Description(capture(&caps, 1));
        }
        if let Some(caps) = EXTENDED_DESC.captures(text) {
            return LineKind::ExtendedDescription(capture(&caps, 1));
        }
        if let Some(caps) = TASK.captures(text) {
            return LineKind::Task(capture(&caps, 1));
        }
        if COMMENT_OR_BLANK.is_match(text) {
            return LineKind::CommentOrBlank;
        }
        LineKind::Code
    }
}

fn capture<'a>(caps: &regex::Captures<'a>, group: usize) -> &'a str {
    caps.get(group).map_or("", |m| m.as_str())
}

fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Collect the task block starting at `start`, bounded by balanced
/// `do`/`{` and `end`/`}` outside string literals
fn extract_task_source(lines: &[&str], start: usize) -> String {
    let mut depth: i64 = 0;
    let mut source = String::new();
    let mut consumed = 0;

    for line in &lines[start..] {
        source.push_str(line);
        consumed += 1;

        let stripped = STRING_LITERAL.replace_all(line, "");
        depth += BLOCK_OPENER.find_iter(&stripped).count() as i64;
        depth -= BLOCK_CLOSER.find_iter(&stripped).count() as i64;

        if depth <= 0 && consumed > 1 {
            break;
        }
    }

    source
}

/// Argument names from `task :name, [:a, :b] => :deps`
fn extract_task_args(line: &str) -> Vec<String> {
    let Some(caps) = TASK_ARGS.captures(line) else {
        return Vec::new();
    };

    ARG_NAME
        .captures_iter(&caps[1])
        .map(|c| c[1].to_string())
        .collect()
}

/// Keyword arguments of an extended description, possibly spread over
/// the following lines
fn parse_extended_options(lines: &[&str], start: usize) -> Annotations {
    let end = (start + EXTENDED_DESC_LOOKAHEAD + 1).min(lines.len());
    let chunk: String = lines[start..end].concat();
    let mut annotations = Annotations::default();

    if let Some(caps) = OPT_TEAM.captures(&chunk) {
        annotations.team = Some(caps[1].to_string());
    }
    if let Some(caps) = OPT_SAFETY.captures(&chunk) {
        annotations.safety = Some(caps[1].to_string());
    }
    if let Some(caps) = OPT_KEYWORDS_WORDS.captures(&chunk) {
        annotations.keywords = Some(caps[1].split_whitespace().map(str::to_string).collect());
    } else if let Some(caps) = OPT_KEYWORDS_ARRAY.captures(&chunk) {
        let unquoted = caps[1].replace(['\'', '"'], "");
        annotations.keywords = Some(split_keywords(&unquoted));
    }

    annotations
}
