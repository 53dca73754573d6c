use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use zen_apropos::cli::{Cli, Commands};
use zen_apropos::lint::{changed_files, Linter};
use zen_apropos::{discover_files, Config, Engine, ResultFormatter};

fn main() -> anyhow::Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.config();
    config.validate()?;

    match &cli.command {
        Some(Commands::Lint { changed_only }) => handle_lint(&config, *changed_only),
        None => handle_search(&config, cli.query_text().as_deref(), cli.plain),
    }
}

/// Logs go to stderr so stdout stays pipeable; `RUST_LOG` overrides
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_search(config: &Config, query: Option<&str>, plain: bool) -> anyhow::Result<ExitCode> {
    let engine = Engine::new(config)?;

    let Some(query) = query else {
        println!("{}", engine.help());
        return Ok(ExitCode::SUCCESS);
    };

    let outcome = engine
        .search(query)
        .with_context(|| format!("Failed to search tasks under {}", config.root.display()))?;

    let formatter = ResultFormatter::new(&outcome);
    if plain {
        println!("{}", formatter.format_plain());
    } else {
        println!("{}", formatter.format_rich());
    }

    Ok(ExitCode::SUCCESS)
}

fn handle_lint(config: &Config, changed_only: bool) -> anyhow::Result<ExitCode> {
    let files = if changed_only {
        changed_files(&config.root)
    } else {
        discover_files(&config.root, &config.patterns())
            .with_context(|| format!("Failed to scan {}", config.root.display()))?
    };

    let warnings = Linter::new(config)?.run(&files)?;

    if warnings.is_empty() {
        println!("\n✅ All rake tasks have @{} annotations.", config.tag);
        return Ok(ExitCode::SUCCESS);
    }

    println!();
    for warning in &warnings {
        println!(
            "⚠ {}:{} — task \"{}\" has no @{} annotations",
            warning.file.display(),
            warning.line,
            warning.task_name,
            config.tag
        );
    }
    println!(
        "\n{} task(s) missing annotations. Consider adding @{} tags or using zen_desc.",
        warnings.len(),
        config.tag
    );

    Ok(ExitCode::FAILURE)
}
