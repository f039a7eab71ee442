use anyhow::Result;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::error::WranglerError;
use crate::wrangler::dialect::{self, Dialect};
use crate::wrangler::fsutil;

#[derive(Debug, Clone, Default)]
pub struct ClassifyOptions {
    pub input_dir: PathBuf,
}

/// Read-only pass over the input: what would `wrangle` recognise?
pub fn run(opts: &ClassifyOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("classify");
    if !opts.input_dir.is_dir() {
        return Err(WranglerError::InvalidInput(format!(
            "input directory does not exist: {}",
            opts.input_dir.display()
        ))
        .into());
    }

    let paths = fsutil::list_files(&opts.input_dir)?;
    let total = paths.len();
    report.detail(format!("input_files: {total}"));

    // Anomalies are fixable, so they are not reported as unmatched.
    let rest: Vec<String> = paths
        .into_iter()
        .filter(|p| !dialect::is_title_code_anomaly(p))
        .collect();
    report.detail(format!("title_code_anomalies: {}", total - rest.len()));
    let classification = dialect::classify_paths(rest);

    let counts = classification.count_by_dialect();
    for d in Dialect::PRIORITY {
        report.detail(format!(
            "{}: {}",
            d.name(),
            counts.get(&d).copied().unwrap_or(0)
        ));
    }
    let stubs: BTreeSet<&str> = classification
        .classified
        .iter()
        .map(|c| c.stub())
        .collect();
    report.detail(format!("unique_stubs: {}", stubs.len()));

    for path in &classification.unmatched {
        report.issue(format!("unmatched: {path}"));
    }
    Ok(report)
}
