//! notemill: publish a vault of markdown notes as blog posts.
//!
//! Walks the input directory for notes marked `publish: true`, runs
//! each through the core transformation pipeline against the set of
//! permalinks being published, writes the results to the output
//! directory, and offers to delete outputs the vault no longer
//! produces.

use anyhow::{Context, Result};
use clap::Parser;
use notemill_core::{DEFAULT_LAYOUT, TransformOptions, transform};
use owo_colors::OwoColorize;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

mod notes;
mod output;

use notes::discover_notes;
use output::{AlwaysConfirm, Confirm, StdinConfirm, delete_stale, stale_outputs};

#[derive(Debug, Parser)]
#[command(name = "notemill", version, about = "Publish markdown notes as blog posts")]
struct Cli {
    /// Directory containing the markdown notes.
    input: PathBuf,
    /// Directory the published posts are written to.
    output: PathBuf,
    /// Layout value injected into every post's frontmatter.
    #[arg(long, default_value = DEFAULT_LAYOUT)]
    layout: String,
    /// Tags never copied into a post's frontmatter.
    #[arg(long = "skip-tag")]
    skip_tags: Vec<String>,
    /// Delete stale outputs without asking.
    #[arg(long)]
    yes: bool,
    /// Report what would happen without writing or deleting anything.
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let notes = discover_notes(&cli.input)?;
    let published: Vec<_> = notes.iter().filter(|note| note.publish).collect();
    let permalinks: HashSet<String> = published.iter().map(|note| note.stem.clone()).collect();

    let options = TransformOptions {
        layout: Some(cli.layout.clone()),
        tag_blacklist: cli.skip_tags.iter().cloned().collect(),
        ..TransformOptions::default()
    };

    if !cli.dry_run {
        fs::create_dir_all(&cli.output)
            .with_context(|| format!("creating {}", cli.output.display()))?;
    }

    let mut produced: HashSet<String> = HashSet::new();
    let mut failed = 0usize;
    for note in &published {
        match transform(&note.source, &permalinks, &options) {
            Ok(text) => {
                if !cli.dry_run {
                    let target = cli.output.join(&note.base);
                    fs::write(&target, text)
                        .with_context(|| format!("writing {}", target.display()))?;
                }
                produced.insert(note.base.clone());
                println!("{} {}", "published".green(), note.base);
            }
            // One broken note never aborts the rest of the vault.
            Err(err) => {
                failed += 1;
                eprintln!("{} {}: {err}", "failed".red(), note.path.display());
            }
        }
    }

    let deleted = if cli.output.is_dir() {
        let stale = stale_outputs(&cli.output, &produced)?;
        let mut confirm: Box<dyn Confirm> = if cli.yes {
            Box::new(AlwaysConfirm)
        } else {
            Box::new(StdinConfirm)
        };
        delete_stale(&stale, confirm.as_mut(), cli.dry_run)?
    } else {
        0
    };

    println!(
        "{} published, {} failed, {} stale deleted ({} notes total)",
        produced.len(),
        failed,
        deleted,
        notes.len()
    );
    Ok(())
}
