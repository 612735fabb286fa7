use std::fs;
use std::path::{Path, PathBuf};

use album_downloader::dedup_log_file;
use album_downloader::store::METADATA_FILE_NAME;
use anyhow::{Context, Result};
use clap::Parser;

/// Remove duplicate lines from known-URL logs, keeping a `.bak` of each changed file.
#[derive(Parser, Debug)]
#[command(name = "dedup-photo-urls")]
#[command(
    author,
    version,
    about = "Remove duplicate lines from photo_urls.txt logs"
)]
struct Args {
    /// photo_urls.txt files, or directories searched recursively for them
    #[arg(default_value = ".")]
    inputs: Vec<PathBuf>,
}

/// Totals over every processed log.
#[derive(Debug, Default)]
struct DedupRun {
    processed: usize,
    removed: usize,
    errors: Vec<(PathBuf, String)>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let logs = collect_log_files(&args.inputs)?;
    if logs.is_empty() {
        eprintln!("No {METADATA_FILE_NAME} files found");
        return Ok(());
    }

    let run = dedup_all(&logs);
    eprintln!(
        "Processed {} of {} log file(s), removed {} duplicate line(s)",
        run.processed,
        logs.len(),
        run.removed
    );

    if !run.errors.is_empty() {
        anyhow::bail!("{} log file(s) could not be deduplicated", run.errors.len());
    }
    Ok(())
}

/// Deduplicates each log in turn. A failing file is reported and skipped.
fn dedup_all(logs: &[PathBuf]) -> DedupRun {
    let mut run = DedupRun::default();

    for log in logs {
        let report = match dedup_log_file(log) {
            Ok(report) => report,
            Err(e) => {
                eprintln!("Failed to deduplicate {}: {e}", log.display());
                run.errors.push((log.clone(), e.to_string()));
                continue;
            }
        };
        run.processed += 1;
        run.removed += report.removed();
        match &report.backup {
            Some(backup) => println!(
                "{}: {} -> {} lines ({} duplicates removed, backup at {})",
                log.display(),
                report.original_lines,
                report.unique_lines,
                report.removed(),
                backup.display()
            ),
            None => println!("{}: no duplicates", log.display()),
        }
    }

    run
}

fn collect_log_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_file() {
            if is_log_file(input) {
                files.push(input.clone());
            } else {
                eprintln!(
                    "Skipping {}: not a {METADATA_FILE_NAME} file",
                    input.display()
                );
            }
            continue;
        }

        if input.is_dir() {
            collect_log_files_recursive(input, &mut files)?;
            continue;
        }

        eprintln!("Input path does not exist: {}", input.display());
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn is_log_file(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == METADATA_FILE_NAME)
}

fn collect_log_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        if path.is_dir() {
            collect_log_files_recursive(&path, files)?;
        } else if is_log_file(&path) {
            files.push(path);
        }
    }

    Ok(())
}
