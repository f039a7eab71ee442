use anyhow::Result;
use std::path::PathBuf;

use crate::alto2txt::{self, lookup::TitleLookup};
use crate::commands::{CommandReport, log_fatal};
use crate::config;
use crate::logging;

#[derive(Debug, Clone, Default)]
pub struct RetitleOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub lookup: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
    pub dry_run: bool,
    pub debug: bool,
}

pub fn run(opts: &RetitleOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("retitle");
    let cfg = config::load_config()?;
    let working_dir = opts.working_dir.clone().unwrap_or(cfg.working_dir);
    std::fs::create_dir_all(&working_dir)?;
    let log_file = working_dir.join(alto2txt::LOG_FILE);

    let (input, output) = alto2txt::prepare_dirs(&opts.input_dir, &opts.output_dir)?;
    logging::init_file_logging(&log_file, opts.debug)?;
    logging::log_run_header("retitle", opts.dry_run);
    tracing::info!("Input directory: {}", input.display());
    tracing::info!("Output directory: {}", output.display());

    let lookup_path = opts.lookup.clone().unwrap_or(cfg.title_lookup_file);
    let lookup = TitleLookup::load(&lookup_path).map_err(log_fatal)?;
    if lookup.is_empty() {
        tracing::warn!("Title lookup {} has no rows", lookup_path.display());
    }
    tracing::info!(
        "Loaded {} title codes from {}",
        lookup.len(),
        lookup_path.display()
    );

    let summary = alto2txt::run(&input, &output, &lookup, opts.dry_run).map_err(log_fatal)?;

    report.detail(format!("log: {}", log_file.display()));
    if summary.dry_run {
        report.detail("dry_run: true (nothing written)");
    }
    report.detail(format!("metadata_files: {}", summary.metadata_files));
    report.detail(format!("rewritten: {}", summary.rewritten));
    report.detail(format!("skipped: {}", summary.skipped));
    report.detail(format!("plaintext_copied: {}", summary.plaintext_copied));
    for warning in summary.warnings {
        report.issue(warning);
    }
    Ok(report)
}
