use crate::core::entry::Entry;
use crate::search::engine::SearchOutcome;
use console::style;

const BOX_WIDTH: usize = 60;
const GROUP_RULE_WIDTH: usize = 55;

/// Renders a [`SearchOutcome`] for a terminal or a pipe
pub struct ResultFormatter<'a> {
    outcome: &'a SearchOutcome,
}

impl<'a> ResultFormatter<'a> {
    pub fn new(outcome: &'a SearchOutcome) -> Self {
        Self { outcome }
    }

    /// One `name | description | safety | team` line per result
    pub fn format_plain(&self) -> String {
        self.outcome
            .results
            .iter()
            .map(|entry| {
                format!(
                    "{:<40} | {:<50} | {:<12} | {}",
                    entry.name,
                    entry.description,
                    entry.safety().unwrap_or("-"),
                    entry.team().unwrap_or("-")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Boxed header, numbered entries per group and a summary line
    pub fn format_rich(&self) -> String {
        let mut output = vec![self.header_box(), String::new()];

        let mut number = 1;
        for group in &self.outcome.groups {
            output.push(self.format_group(group.label(), &group.entries, number));
            output.push(String::new());
            number += group.entries.len();
        }

        output.push(self.summary_line());
        output.join("\n")
    }

    fn header_box(&self) -> String {
        let title = format!(
            "ZenApropos — {} results for \"{}\"",
            self.outcome.results.len(),
            self.outcome.query
        );

        let mut lines = vec![style(format!("╭{}╮", "─".repeat(BOX_WIDTH))).cyan().to_string()];
        lines.push(boxed_line(&style(&title).bold().to_string(), title.chars().count()));
        if let Some(dimension) = self.outcome.group_dimension {
            let label = format!("Grouped by: {}", dimension);
            lines.push(boxed_line(&style(&label).dim().to_string(), label.chars().count()));
        }
        lines.push(style(format!("╰{}╯", "─".repeat(BOX_WIDTH))).cyan().to_string());
        lines.join("\n")
    }

    fn format_group(&self, label: &str, entries: &[Entry], start: usize) -> String {
        let bar = style("│").cyan();
        let rule = "─".repeat(GROUP_RULE_WIDTH.saturating_sub(label.chars().count()));
        let mut lines = vec![format!(
            "{} {} {}",
            style("┌").cyan(),
            style(label).bold(),
            style(rule).cyan()
        )];

        for (i, entry) in entries.iter().enumerate() {
            lines.push(format!(
                "{} {} {}",
                bar,
                style(format!("[{}]", start + i)).dim(),
                style(format!("rake {}", entry.name)).bold()
            ));
            if !entry.description.is_empty() {
                lines.push(format!("{}   {}", bar, entry.description));
            }
            lines.push(format!("{}   {}", bar, style(format!("$ {}", entry.usage())).dim()));
            if entry.safety().is_some() || entry.team().is_some() {
                lines.push(format!("{}   {}", bar, format_badges(entry)));
            }
            if let Some(context) = self.outcome.context_for(entry) {
                for (line_number, content) in &context.lines {
                    let marker = if *line_number == context.matched_line {
                        style(">").yellow().to_string()
                    } else {
                        " ".to_string()
                    };
                    lines.push(format!(
                        "{}   {} {} {}",
                        bar,
                        marker,
                        style(format!("{}:", line_number)).dim(),
                        content.trim_end()
                    ));
                }
            }
            if i + 1 < entries.len() {
                lines.push(bar.to_string());
            }
        }

        lines.push(style(format!("└{}", "─".repeat(BOX_WIDTH - 2))).cyan().to_string());
        lines.join("\n")
    }

    fn summary_line(&self) -> String {
        let count = self.outcome.groups.len();
        let word = self
            .outcome
            .group_dimension
            .map(|d| d.as_str())
            .unwrap_or("group");

        format!(
            "{} results across {} {}{} ({:.2}s)",
            self.outcome.results.len(),
            count,
            word,
            if count == 1 { "" } else { "s" },
            self.outcome.elapsed.as_secs_f64()
        )
    }
}

/// `│  <content><padding>│` where `width` is the unstyled content width
fn boxed_line(content: &str, width: usize) -> String {
    let padding = " ".repeat(BOX_WIDTH.saturating_sub(width + 2));
    format!("{}  {}{}{}", style("│").cyan(), content, padding, style("│").cyan())
}

fn format_badges(entry: &Entry) -> String {
    let mut parts = Vec::new();
    if let Some(safety) = entry.safety() {
        parts.push(safety_badge(safety));
    }
    if let Some(team) = entry.team() {
        parts.push(style(format!("team: {}", team)).dim().to_string());
    }
    parts.join("  ·  ")
}

fn safety_badge(safety: &str) -> String {
    match safety {
        "safe" => style("⚡ safe").green().to_string(),
        "caution" => style("⚠️  caution").yellow().to_string(),
        "destructive" => style("🔴 destructive").red().to_string(),
        other => other.to_string(),
    }
}
