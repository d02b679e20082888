mod cli;

use anyhow::Context;
use std::io::Write;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr so command output on stdout stays pipeable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = cli::parse(std::env::args().skip(1))?;
    let config = match &cli.config {
        Some(path) => editor_state::config::EditorConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => editor_state::config::EditorConfig::default(),
    };

    run(&cli, config, &mut std::io::stdout().lock())
}

fn run(
    cli: &cli::Cli,
    config: editor_state::config::EditorConfig,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let defaults = config.search.clone();
    let mut document = editor_state::document::Document::open(&cli.path, config)
        .with_context(|| format!("opening {}", cli.path.display()))?;

    match &cli.command {
        cli::Command::Stats => {
            writeln!(out, "bytes: {}", document.len())?;
            writeln!(out, "lines: {}", document.line_count())?;
            writeln!(out, "pieces: {}", document.table().piece_count())?;
        }
        cli::Command::Find { pattern } => {
            let query = cli.flags.apply(defaults.query(pattern.as_str()));
            let engine = editor_core::search::SearchEngine::compile(query)?;
            let matches = engine.find_all(document.table())?;

            tracing::info!(count = matches.len(), "find finished");

            if matches.is_empty() {
                return Err(editor_core::errors::EditorError::NoMatch.into());
            }

            let mut pending = matches.iter().peekable();

            for (line, range) in document.line_index().lines(0..document.line_count()) {
                let mut content = None;

                while let Some(found) = pending.next_if(|found| found.range.start < range.end) {
                    if content.is_none() {
                        content = Some(document.line_content(line)?.1);
                    }

                    let (_, column) = document.line_column(found.range.start)?;
                    let text = String::from_utf8_lossy(content.as_deref().unwrap_or_default());

                    writeln!(out, "{}:{}: {}", line + 1, column + 1, text)?;
                }
            }
        }
        cli::Command::Replace { pattern, replacement } => {
            let query = cli.flags.apply(defaults.query(pattern.as_str()));

            // Surface a bad pattern here; the document treats it as "no match".
            editor_core::search::SearchEngine::compile(query.clone())?;

            let count = document.replace_all(&query, replacement)?;

            if count > 0 {
                document.save()?;
            }

            writeln!(out, "{count} replacement(s)")?;
        }
    }

    Ok(())
}
