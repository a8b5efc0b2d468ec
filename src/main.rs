use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use idiom_patcher::catalog::compile_file;
use idiom_patcher::{builtin_passes, Driver, DriverError, FileOutcome, KotlinParser};
use similar::{ChangeTag, TextDiff};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "idiom-patcher")]
#[command(about = "Syntax-aware idiom cleanup for Kotlin sources", long_about = None)]
#[command(version)]
struct Cli {
    /// Idiom catalog (TOML) to run after the built-in idioms
    #[arg(short, long)]
    catalog: Option<PathBuf>,

    /// Skip the built-in idioms
    #[arg(long)]
    no_builtin: bool,

    /// Dry run - show what would be changed without modifying files
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show unified diff of changes
    #[arg(short, long)]
    diff: bool,

    /// Kotlin files, or directories to search for `.kt`/`.kts` files
    files: Vec<PathBuf>,
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();

    let files = collect_inputs(&cli.files)?;
    if files.is_empty() {
        eprintln!("{}", DriverError::NoInputFiles);
        return Ok(ExitCode::from(2));
    }

    let mut parser = KotlinParser::new()?;
    let mut passes = if cli.no_builtin {
        Vec::new()
    } else {
        builtin_passes(&mut parser)?
    };
    if let Some(path) = &cli.catalog {
        passes.extend(compile_file(&mut parser, path)?);
    }
    log::debug!("{} pass(es) loaded", passes.len());

    let mut driver = Driver::new(parser, passes).dry_run(cli.dry_run);
    let report = driver.run(&files)?;

    if cli.dry_run {
        println!("{}", "[DRY RUN - no files were modified]".cyan());
    }

    for file in &report.files {
        match &file.outcome {
            FileOutcome::Unchanged => {
                println!("{} {}", "⊙".yellow(), file);
            }
            FileOutcome::Rewritten {
                original,
                rewritten,
                ..
            } => {
                println!("{} {}", "✓".green(), file);
                if cli.diff {
                    display_diff(&file.path, original, rewritten);
                }
            }
            FileOutcome::Skipped { .. } => {
                eprintln!("{} {}", "✗".red(), file);
            }
        }
        for aborted in &file.aborted {
            eprintln!(
                "  {} pass '{}' aborted: {}",
                "!".yellow(),
                aborted.pass,
                aborted.reason
            );
        }
    }

    println!();
    println!(
        "Summary: {} rewritten, {} unchanged, {} skipped",
        report.rewritten(),
        report.files.len() - report.rewritten() - report.skipped(),
        report.skipped()
    );

    if report.has_failures() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Expand directories into the Kotlin files under them; plain file
/// arguments are kept as given.
fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(path) {
            let entry = entry?;
            if entry.file_type().is_file() && is_kotlin(entry.path()) {
                found.push(entry.path().to_path_buf());
            }
        }
        found.sort();
        files.extend(found);
    }

    Ok(files)
}

fn is_kotlin(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("kt") | Some("kts")
    )
}

/// Print a unified diff of one rewritten file, three lines of context per
/// hunk.
fn display_diff(file: &Path, original: &str, rewritten: &str) {
    let diff = TextDiff::from_lines(original, rewritten);
    let mut unified = diff.unified_diff();
    unified.context_radius(3);

    println!();
    println!("{}", format!("--- a/{}", file.display()).dimmed());
    println!("{}", format!("+++ b/{}", file.display()).dimmed());
    for hunk in unified.iter_hunks() {
        println!("{}", hunk.header().to_string().cyan());
        for change in hunk.iter_changes() {
            let line = match change.tag() {
                ChangeTag::Delete => format!("-{change}").red(),
                ChangeTag::Insert => format!("+{change}").green(),
                ChangeTag::Equal => format!(" {change}").normal(),
            };
            print!("{line}");
            if change.missing_newline() {
                println!();
            }
        }
    }
}
