use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::{CreateCallRewriter, Injection};

const SKIP_DIRS: &[&str] = &["node_modules", "__tests__", ".git", "dist", "build"];

pub struct FileResult {
    pub path: PathBuf,
    pub injections: Vec<Injection>,
}

#[derive(Default)]
pub struct RunStats {
    pub scanned: usize,
    pub modified: usize,
    pub failed: usize,
    pub injections: usize,
}

/// TypeScript sources under `root`, excluding tests, declarations and build output.
pub fn collect_sources(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !(entry.file_type().is_some_and(|t| t.is_dir()) && SKIP_DIRS.contains(&&*name))
        })
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.context("Failed to read directory entry")?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        if is_rewritable(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn is_rewritable(path: &Path) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return false,
    };
    name.ends_with(".ts") && !name.ends_with(".test.ts") && !name.ends_with(".d.ts")
}

/// Rewrite every file in parallel. Per-file I/O failures are logged and counted.
pub fn rewrite_files(
    rewriter: &CreateCallRewriter,
    files: &[PathBuf],
    dry_run: bool,
) -> (Vec<FileResult>, RunStats) {
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let outcomes: Vec<Result<FileResult>> = files
        .par_iter()
        .map(|path| {
            let res = rewrite_file(rewriter, path, dry_run);
            pb.inc(1);
            res
        })
        .collect();
    pb.finish_and_clear();

    let mut stats = RunStats {
        scanned: files.len(),
        ..Default::default()
    };
    let mut results = Vec::new();
    for (path, outcome) in files.iter().zip(outcomes) {
        match outcome {
            Ok(r) if r.injections.is_empty() => {}
            Ok(r) => {
                stats.modified += 1;
                stats.injections += r.injections.len();
                results.push(r);
            }
            Err(e) => {
                stats.failed += 1;
                warn!("Failed to process {}: {:#}", path.display(), e);
            }
        }
    }
    (results, stats)
}

fn rewrite_file(rewriter: &CreateCallRewriter, path: &Path, dry_run: bool) -> Result<FileResult> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let (rewritten, injections) = rewriter.rewrite(&source);

    if !injections.is_empty() {
        if dry_run {
            debug!("Would modify {} ({} injections)", path.display(), injections.len());
        } else {
            std::fs::write(path, rewritten)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Modified {} ({} injections)", path.display(), injections.len());
        }
    }

    Ok(FileResult {
        path: path.to_path_buf(),
        injections,
    })
}
