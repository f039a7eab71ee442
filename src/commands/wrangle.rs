use anyhow::Result;
use std::path::PathBuf;

use crate::commands::{CommandReport, log_fatal};
use crate::config;
use crate::logging;
use crate::wrangler::paths::RunPaths;
use crate::wrangler::run::{self, RunOptions};

#[derive(Debug, Clone, Default)]
pub struct WrangleOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub working_dir: Option<PathBuf>,
    pub dry_run: bool,
    pub debug: bool,
    pub quiet: bool,
}

pub fn run(opts: &WrangleOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("wrangle");
    let cfg = config::load_config()?;
    let working_root = opts.working_dir.clone().unwrap_or(cfg.working_dir);

    let paths = RunPaths::prepare(&opts.input_dir, &opts.output_dir, &working_root)?;
    logging::init_file_logging(&paths.log_file, opts.debug)?;
    logging::log_run_header("wrangle", opts.dry_run);
    tracing::info!("Input directory: {}", paths.input_dir.display());
    tracing::info!("Output directory: {}", paths.output_dir.display());
    tracing::info!("Working directory: {}", paths.working_dir.display());

    let run_opts = RunOptions {
        dry_run: opts.dry_run,
        alt_suffix: cfg.alt_filename_suffix,
        progress: cfg.progress && !opts.quiet,
    };
    let summary = run::run(&paths, &run_opts).map_err(log_fatal)?;
    tracing::info!("Done.");

    report.detail(format!("log: {}", paths.log_file.display()));
    report.detail(format!("working_dir: {}", paths.working_dir.display()));
    if summary.dry_run {
        report.detail("dry_run: true (output tree untouched, validation skipped)");
    }
    report.detail(format!("input_files: {}", summary.input_files));
    report.detail(format!("anomalies_fixed: {}", summary.anomalies_fixed));
    report.detail(format!("stubs: {}", summary.stubs));
    report.detail(format!("dir_copies: {}", summary.dir_copies));
    report.detail(format!("file_copies: {}", summary.file_copies));
    report.detail(format!("duplicates: {}", summary.duplicates));
    report.detail(format!("conflicts: {}", summary.conflicts));
    report.detail(format!("ignored: {}", summary.ignored));
    if !summary.dry_run {
        report.detail(format!("new_output_files: {}", summary.new_output_files));
    }
    Ok(report)
}
