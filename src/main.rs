//! Main entry point for the docfill CLI application.
//!
//! This binary fills `%%PLACEHOLDER%%` fields in the `word/document.xml`
//! member of a docx package: the archive is unpacked into a staging
//! directory, the target member is rewritten line by line from the lookup
//! file, and the tree is repacked into a fresh archive. Everything except
//! the substituted member round-trips byte for byte.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use docfill::{lookup, pack_directory, rewrite_file, Cli, LocalFileReader, RewriteReport, ZipExtractor};

/// Archive-internal path of the member that carries the document text.
///
/// Standard OOXML packaging layout; every other member passes through
/// unchanged.
const TARGET_MEMBER: &str = "word/document.xml";

/// Application entry point.
///
/// Sequences the whole run: load the lookup file, unpack the input
/// archive, substitute the target member, repack, clean up the staging
/// tree. Any failure aborts with context; the staging tree is left in
/// place for inspection when a later step fails.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let lookup = lookup::load(&cli.database)?;
    if !cli.is_quiet() {
        println!(
            "{} substitution entries loaded from {}",
            lookup.len(),
            cli.database.display()
        );
    }

    // The staging tree is exclusively owned by this run. Refusing a
    // pre-existing directory avoids repacking foreign files into the
    // output archive.
    if cli.temp_dir.exists() {
        bail!(
            "staging directory {} already exists; remove it or pick another with -t",
            cli.temp_dir.display()
        );
    }

    let entry_count = unpack_input(&cli)?;
    if !cli.is_quiet() {
        println!(
            "{} entries unpacked into {}",
            entry_count,
            cli.temp_dir.display()
        );
    }

    let report = fill_target(&cli, &lookup)?;
    print_report(&cli, &report);

    pack_directory(&cli.temp_dir, &cli.output)
        .with_context(|| format!("cannot repack {}", cli.output.display()))?;
    if !cli.is_quiet() {
        println!("wrote {}", cli.output.display());
    }

    cleanup(&cli)?;

    Ok(())
}

/// Unpack the input archive into the staging directory.
///
/// # Returns
///
/// The number of archive entries extracted.
fn unpack_input(cli: &Cli) -> Result<usize> {
    let reader = LocalFileReader::new(&cli.input)
        .with_context(|| format!("cannot open {}", cli.input.display()))?;
    let extractor = ZipExtractor::new(Arc::new(reader));

    extractor
        .unpack(&cli.temp_dir)
        .with_context(|| format!("cannot unpack {}", cli.input.display()))
}

/// Substitute placeholders in the unpacked document member.
fn fill_target(cli: &Cli, lookup: &HashMap<String, String>) -> Result<RewriteReport> {
    let target = target_path(cli);
    if !target.is_file() {
        bail!(
            "{} has no {} member; is it a docx package?",
            cli.input.display(),
            TARGET_MEMBER
        );
    }

    rewrite_file(&target, lookup)
        .with_context(|| format!("cannot substitute {}", target.display()))
}

/// Report substitution results and scan warnings.
fn print_report(cli: &Cli, report: &RewriteReport) {
    if !cli.is_very_quiet() {
        for line in &report.unterminated_lines {
            eprintln!(
                "warning: {} line {}: unterminated %% delimiter left as-is",
                TARGET_MEMBER, line
            );
        }
    }

    if !cli.is_quiet() {
        println!(
            "substituted {} of {} lines in {}",
            report.substituted_lines, report.lines, TARGET_MEMBER
        );
    }
}

/// Remove the staging tree after a successful run (unless kept).
fn cleanup(cli: &Cli) -> Result<()> {
    if cli.keep_tree {
        if !cli.is_quiet() {
            println!("staging tree kept at {}", cli.temp_dir.display());
        }
        return Ok(());
    }

    fs::remove_dir_all(&cli.temp_dir)
        .with_context(|| format!("cannot remove {}", cli.temp_dir.display()))
}

/// Filesystem path of the target member inside the staging tree.
fn target_path(cli: &Cli) -> PathBuf {
    let mut path = cli.temp_dir.clone();
    path.extend(TARGET_MEMBER.split('/'));
    path
}
