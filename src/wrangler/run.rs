use crate::error::WranglerError;
use crate::wrangler::dialect::{self, Classified, Dialect};
use crate::wrangler::duplicates::{self, DuplicateOutcome};
use crate::wrangler::fsutil::{self, path_to_string};
use crate::wrangler::manifest;
use crate::wrangler::paths::RunPaths;
use crate::wrangler::planner::{self, MergePlan};
use crate::wrangler::probe::{FsOutputTree, OutputTree};
use crate::wrangler::standardize;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

pub const DEFAULT_ALT_SUFFIX: &str = "_ALT";

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub dry_run: bool,
    pub alt_suffix: String,
    pub progress: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            alt_suffix: DEFAULT_ALT_SUFFIX.to_string(),
            progress: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub input_files: usize,
    pub anomalies_fixed: usize,
    pub stubs: usize,
    pub dir_copies: usize,
    pub file_copies: usize,
    pub duplicates: usize,
    pub conflicts: usize,
    pub ignored: usize,
    pub new_output_files: usize,
    pub dry_run: bool,
}

/// Copies each anomalous lsidyv file into the working directory under its
/// corrected name and swaps the listed path for the copy. Inputs stay put.
fn fix_anomalies(paths: &mut [String], input_dir: &Path, working_dir: &Path) -> Result<usize> {
    let mut fixed = 0usize;
    for path in paths.iter_mut() {
        let Some(corrected) = dialect::fix_title_code_anomaly(path, input_dir, working_dir) else {
            continue;
        };
        if let Some(parent) = corrected.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let mut source =
            File::open(path.as_str()).with_context(|| format!("failed to open {path}"))?;
        let mut target = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&corrected)
            .with_context(|| {
                format!("refusing to overwrite corrected copy {}", corrected.display())
            })?;
        io::copy(&mut source, &mut target).with_context(|| {
            format!("failed to copy {} to {}", path, corrected.display())
        })?;
        tracing::info!(
            "Fixed title code anomaly: {} copied to {}",
            path,
            corrected.display()
        );
        *path = path_to_string(&corrected)?;
        fixed += 1;
    }
    Ok(fixed)
}

fn copy_single_file(from: &str, to_dir: &Path, dry_run: bool) -> Result<()> {
    let file_name = Path::new(from)
        .file_name()
        .with_context(|| format!("input path has no file name: {from}"))?;
    tracing::debug!("Copying file {} to {}", from, to_dir.display());
    if dry_run {
        return Ok(());
    }
    if !to_dir.is_dir() {
        fs::create_dir_all(to_dir)
            .with_context(|| format!("failed to create {}", to_dir.display()))?;
        tracing::info!("Created subdirectory at {}", to_dir.display());
    }
    let target = to_dir.join(file_name);
    fs::copy(from, &target)
        .with_context(|| format!("failed to copy {} to {}", from, target.display()))?;
    Ok(())
}

fn dispatch(
    plan: &MergePlan,
    paths: &RunPaths,
    opts: &RunOptions,
    summary: &mut RunSummary,
) -> Result<()> {
    match plan {
        MergePlan::CopyDir {
            from,
            to,
            granularity,
        } => {
            tracing::info!(
                "Copying {} directory {} to {}",
                granularity.as_str(),
                from,
                to.display()
            );
            if !opts.dry_run {
                fsutil::copy_tree(Path::new(from), to)?;
                standardize::standardize_tree(to)?;
            }
            summary.dir_copies += 1;
        }
        MergePlan::CopyFile { from, to_dir } => {
            copy_single_file(from, to_dir, opts.dry_run)?;
            summary.file_copies += 1;
        }
        MergePlan::Collision { from, target_file } => {
            let outcome = duplicates::resolve_duplicate(
                Path::new(from),
                target_file,
                &paths.manifests.duplicates,
                &opts.alt_suffix,
                opts.dry_run,
            )?;
            match outcome {
                DuplicateOutcome::Duplicate { existing } => {
                    tracing::debug!("{} duplicates {}", from, existing.display());
                    summary.duplicates += 1;
                }
                DuplicateOutcome::Conflict { alt_path } => {
                    tracing::debug!("{} kept as {}", from, alt_path.display());
                    summary.conflicts += 1;
                }
            }
        }
    }
    Ok(())
}

/// How many of `pending` a plan covers: everything under a copied
/// directory, otherwise just the head.
fn consumed_by(plan: &MergePlan, pending: &[Classified]) -> usize {
    match plan.consumed_prefix() {
        Some(prefix) => pending
            .iter()
            .take_while(|item| Path::new(&item.path).starts_with(prefix))
            .count(),
        None => 1,
    }
}

fn merge_stub<T: OutputTree + ?Sized>(
    stub: &str,
    items: &[Classified],
    tree: &T,
    paths: &RunPaths,
    opts: &RunOptions,
    summary: &mut RunSummary,
) -> Result<usize> {
    let mut cursor = 0usize;
    while cursor < items.len() {
        let head = &items[cursor];
        let consumed = if head.matched.dialect == Dialect::OsMaps {
            manifest::append_line(&paths.manifests.ignored, &head.path)?;
            summary.ignored += 1;
            1
        } else {
            let plan = planner::determine_from_to(&head.path, &paths.output_dir, tree)?;
            dispatch(&plan, paths, opts, summary)?;
            consumed_by(&plan, &items[cursor..])
        };
        if consumed == 0 {
            return Err(WranglerError::LeftoverFiles(format!(
                "no progress in stub {stub} at {}",
                head.path
            ))
            .into());
        }
        cursor += consumed;
    }
    Ok(cursor)
}

fn reconcile(paths: &RunPaths, summary: &mut RunSummary, output_before: usize) -> Result<()> {
    let output_after = fsutil::count_files(&paths.output_dir)?;
    summary.new_output_files = output_after.saturating_sub(output_before);
    let duplicates = manifest::count_lines(&paths.manifests.duplicates)?;
    let ignored = manifest::count_lines(&paths.manifests.ignored)?;
    let processed = summary.new_output_files + duplicates + ignored;

    tracing::info!(
        "Reconciliation: {} new output files, {} duplicates, {} ignored, {} input files",
        summary.new_output_files,
        duplicates,
        ignored,
        summary.input_files
    );
    if processed != summary.input_files {
        return Err(WranglerError::ReconciliationMismatch {
            processed,
            total: summary.input_files,
        }
        .into());
    }
    Ok(())
}

/// Merges every file under the input directory into the canonical output
/// tree, one stub at a time.
pub fn run(paths: &RunPaths, opts: &RunOptions) -> Result<RunSummary> {
    let mut summary = RunSummary {
        dry_run: opts.dry_run,
        ..RunSummary::default()
    };
    let output_before = fsutil::count_files(&paths.output_dir)?;

    let mut listing = fsutil::list_files(&paths.input_dir)?;
    summary.input_files = listing.len();
    tracing::info!(
        "Found {} input files under {}",
        summary.input_files,
        paths.input_dir.display()
    );

    summary.anomalies_fixed = fix_anomalies(&mut listing, &paths.input_dir, &paths.working_dir)?;
    let classified = dialect::classify_all(listing, &paths.manifests.unmatched)?;
    let groups = dialect::group_by_stub(classified);
    summary.stubs = groups.len();
    tracing::info!("Found {} unique stubs", summary.stubs);

    let tree = FsOutputTree;
    let mut consumed = 0usize;
    for (index, (stub, items)) in groups.iter().enumerate() {
        if opts.progress {
            println!("[{}/{}] {}", index + 1, groups.len(), stub);
        }
        tracing::debug!("Processing stub {} ({} files)", stub, items.len());
        consumed += merge_stub(stub, items, &tree, paths, opts, &mut summary)?;
    }

    if consumed != summary.input_files {
        return Err(WranglerError::LeftoverFiles(format!(
            "processed {consumed} of {} input files",
            summary.input_files
        ))
        .into());
    }

    if opts.dry_run {
        tracing::info!("Dry run complete; output validation skipped");
    } else {
        reconcile(paths, &mut summary, output_before)?;
    }
    Ok(summary)
}
