//! TrueName - live document text rewriter.
//!
//! One-shot CLI front end: loads the persisted settings, parses a document
//! file, runs a single engine sweep over it and writes the rewritten markup
//! to stdout or a file. Replacement counts are accumulated into the
//! persisted stats record.
//!
//! The continuous watcher ([`Replacer`](truename::Replacer)) is a library
//! surface; a one-shot rewrite has no mutation stream to follow.

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use std::fs;
use truename::models::ReplacerConfig;
use truename::{APP_NAME, ConfigManager, TextEngine, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "truename",
    version,
    about = "Rewrite deadnames and pronouns in a document file"
)]
struct Cli {
    /// Document file to rewrite (XHTML/HTML)
    input: Utf8PathBuf,

    /// Write the rewritten document here instead of stdout
    #[arg(short, long)]
    output: Option<Utf8PathBuf>,

    /// Directory holding settings.yaml and stats.yaml
    #[arg(short = 'c', long, default_value = "truename-data")]
    config_dir: Utf8PathBuf,

    /// Override the configured deadname list (comma-separated)
    #[arg(long)]
    deadname: Option<String>,

    /// Override the configured preferred name
    #[arg(long)]
    preferred_name: Option<String>,

    /// Override the configured old pronoun descriptor (e.g. "he/him")
    #[arg(long)]
    old_pronouns: Option<String>,

    /// Override the configured new pronoun descriptor (e.g. "they/them")
    #[arg(long)]
    new_pronouns: Option<String>,

    /// Match name variants anywhere, not just as whole words
    #[arg(long)]
    substring: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard =
        truename::logging::setup_logging_with_console("logs", "truename", cli.debug, true)?;
    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let config_manager = ConfigManager::new(&cli.config_dir)?;
    let mut settings = config_manager.load_settings()?;

    if let Some(deadname) = &cli.deadname {
        settings.deadname = deadname.clone();
    }
    if let Some(preferred_name) = &cli.preferred_name {
        settings.preferred_name = preferred_name.clone();
    }
    if let Some(old_pronouns) = &cli.old_pronouns {
        settings.old_pronouns = old_pronouns.clone();
    }
    if let Some(new_pronouns) = &cli.new_pronouns {
        settings.new_pronouns = new_pronouns.clone();
    }
    if cli.substring {
        settings.whole_word = false;
    }

    let raw = fs::read(&cli.input)
        .with_context(|| format!("Failed to read input document: {}", cli.input))?;

    let config = ReplacerConfig::from_settings(&settings);
    if !settings.is_active || !config.is_actionable() {
        tracing::warn!("Settings inactive or incomplete; passing document through unchanged");
        return write_output(&cli.output, &raw);
    }

    let mut doc = truename::parse::parse_document(&raw)
        .with_context(|| format!("Failed to parse input document: {}", cli.input))?;

    let engine = TextEngine::new(&config);
    let root = doc.root();
    let outcome = engine.sweep(&mut doc, root);

    let rewritten = truename::parse::write_document(&doc);
    write_output(&cli.output, rewritten.as_bytes())?;

    // Accumulate counts into the persisted stats record
    let mut stats = config_manager.load_stats()?;
    stats.name_replacements += outcome.names;
    stats.pronoun_replacements += outcome.pronouns;
    config_manager.save_stats(&stats)?;

    tracing::info!(
        "Replaced {} names and {} pronouns in {} ({} total recorded)",
        outcome.names,
        outcome.pronouns,
        cli.input,
        stats.total()
    );

    Ok(())
}

fn write_output(output: &Option<Utf8PathBuf>, content: &[u8]) -> Result<()> {
    match output {
        Some(path) => fs::write(path, content)
            .with_context(|| format!("Failed to write output document: {}", path)),
        None => {
            use std::io::Write;
            std::io::stdout()
                .write_all(content)
                .context("Failed to write document to stdout")
        }
    }
}
