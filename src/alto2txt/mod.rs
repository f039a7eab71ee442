pub mod lookup;
pub mod metadata;

use crate::error::WranglerError;
use crate::wrangler::fsutil;
use anyhow::{Context, Result, bail};
use lookup::TitleLookup;
use serde::Serialize;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const METADATA_SUFFIX: &str = "_metadata.xml";
pub const PLAINTEXT_EXTENSION: &str = ".txt";
pub const LOG_FILE: &str = "jw_alto2txt.log";

#[derive(Debug, Clone, Default, Serialize)]
pub struct RetitleSummary {
    pub metadata_files: usize,
    pub rewritten: usize,
    pub skipped: usize,
    pub plaintext_copied: usize,
    pub dry_run: bool,
    pub warnings: Vec<String>,
}

fn list_with_suffix(dir: &Path, suffix: &str) -> Result<Vec<String>> {
    Ok(fsutil::list_files(dir)?
        .into_iter()
        .filter(|path| path.ends_with(suffix))
        .collect())
}

fn mirror_path(file: &Path, input: &Path, output: &Path) -> Result<PathBuf> {
    let rel = file
        .strip_prefix(input)
        .with_context(|| format!("{} is not under {}", file.display(), input.display()))?;
    Ok(output.join(rel))
}

/// The `.txt` file alto2txt writes beside each `_metadata.xml`.
pub fn plaintext_sibling(metadata_file: &str) -> Option<String> {
    metadata_file
        .strip_suffix(METADATA_SUFFIX)
        .map(|stem| format!("{stem}{PLAINTEXT_EXTENSION}"))
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("{} has no parent directory", path.display()))?;
    if !parent.is_dir() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
        tracing::info!("Created subdirectory at {}", parent.display());
    }
    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
    tmp.write_all(contents.as_bytes())?;
    tmp.persist(path)
        .map_err(|err| anyhow::anyhow!("failed to persist {}: {}", path.display(), err.error))?;
    Ok(())
}

/// Checks the input exists and the output starts empty; returns both
/// canonicalised.
pub fn prepare_dirs(input: &Path, output: &Path) -> Result<(PathBuf, PathBuf)> {
    if !input.is_dir() {
        return Err(WranglerError::InvalidInput(format!(
            "please provide a valid input directory: {}",
            input.display()
        ))
        .into());
    }
    fs::create_dir_all(output).with_context(|| format!("failed to create {}", output.display()))?;
    let input = fs::canonicalize(input)
        .with_context(|| format!("failed to resolve {}", input.display()))?;
    let output = fs::canonicalize(output)
        .with_context(|| format!("failed to resolve {}", output.display()))?;

    if input.starts_with(&output) || output.starts_with(&input) {
        return Err(WranglerError::InvalidLayout(format!(
            "input {} and output {} must not contain one another",
            input.display(),
            output.display()
        ))
        .into());
    }
    if fsutil::count_files(&output)? > 0 {
        return Err(WranglerError::InvalidLayout(format!(
            "output directory must be initially empty: {}",
            output.display()
        ))
        .into());
    }
    Ok((input, output))
}

/// Rewrites every `_metadata.xml` under `input` into the same relative
/// location under `output` and copies its plaintext sibling unchanged.
pub fn run(
    input: &Path,
    output: &Path,
    lookup: &TitleLookup,
    dry_run: bool,
) -> Result<RetitleSummary> {
    let mut summary = RetitleSummary {
        dry_run,
        ..RetitleSummary::default()
    };
    let metadata_files = list_with_suffix(input, METADATA_SUFFIX)?;
    summary.metadata_files = metadata_files.len();
    tracing::info!("Found {} metadata files.", summary.metadata_files);

    for file in &metadata_files {
        tracing::debug!("Processing file {}", file);
        let xml = fs::read_to_string(file).with_context(|| format!("failed to read {file}"))?;

        let rewrite = match metadata::rewrite_publication_id(&xml, lookup) {
            Ok(rewrite) => rewrite,
            Err(reason) => {
                tracing::warn!(
                    "Skipping file {} & associated plaintext file: {}",
                    file,
                    reason
                );
                summary.skipped += 1;
                continue;
            }
        };
        tracing::debug!("Replaced {} with {} in {}", rewrite.title_code, rewrite.nlp, file);

        let Some(plaintext) = plaintext_sibling(file) else {
            bail!("not a metadata file: {file}");
        };
        if !Path::new(&plaintext).is_file() {
            bail!("Failed to find plaintext file at: {plaintext}");
        }

        if !dry_run {
            write_atomic(&mirror_path(Path::new(file), input, output)?, &rewrite.xml)?;
            let target = mirror_path(Path::new(&plaintext), input, output)?;
            fs::copy(&plaintext, &target)
                .with_context(|| format!("failed to copy {plaintext} to {}", target.display()))?;
        }
        summary.rewritten += 1;
        summary.plaintext_copied += 1;
    }

    if !dry_run {
        summary.warnings = validate(input, output)?;
    }
    Ok(summary)
}

/// Compares metadata and plaintext counts of input and output. Mismatches
/// are reported, not fatal.
pub fn validate(input: &Path, output: &Path) -> Result<Vec<String>> {
    let mut warnings = Vec::new();
    for (label, suffix) in [
        ("metadata", METADATA_SUFFIX),
        ("plaintext", PLAINTEXT_EXTENSION),
    ] {
        let inputs = list_with_suffix(input, suffix)?.len();
        let outputs = list_with_suffix(output, suffix)?.len();
        tracing::info!("Processed {} {} files.", outputs, label);
        if inputs != outputs {
            let msg = format!("unequal input & output {label} file counts: {inputs} vs {outputs}");
            tracing::warn!("{}", msg);
            warnings.push(msg);
        }
    }
    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alto2txt::lookup::tests::SAMPLE;
    use tempfile::tempdir;

    fn metadata(title: &str, date: &str) -> String {
        format!(
            "<?xml version=\"1.0\"?>\n<lwm>\n  <publication id=\"{title}\">\n    <issue id=\"1\">\n      <date>{date}</date>\n    </issue>\n  </publication>\n</lwm>\n"
        )
    }

    fn write(path: &Path, body: &str) {
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, body).expect("write");
    }

    fn lookup() -> TitleLookup {
        TitleLookup::parse(SAMPLE).expect("lookup")
    }

    #[test]
    fn plaintext_sibling_drops_metadata_suffix() {
        assert_eq!(
            plaintext_sibling("/a/RDNP/1850/05/05/WO1_RDNP_1850_05_05-0001-001_metadata.xml")
                .as_deref(),
            Some("/a/RDNP/1850/05/05/WO1_RDNP_1850_05_05-0001-001.txt")
        );
        assert_eq!(plaintext_sibling("/a/b.xml"), None);
    }

    #[test]
    fn run_mirrors_rewritten_metadata_and_plaintext() {
        let tmp = tempdir().expect("tempdir");
        let input = tmp.path().join("in");
        let day = input.join("RDNP/1850/05/05");
        write(&day.join("WO1_RDNP_1850_05_05-0001-001_metadata.xml"), &metadata("RDNP", "1850-05-05"));
        write(&day.join("WO1_RDNP_1850_05_05-0001-001.txt"), "THE PROSPECTS");
        let (input, output) = prepare_dirs(&input, &tmp.path().join("out")).expect("prepare");

        let summary = run(&input, &output, &lookup(), false).expect("run");
        assert_eq!(summary.metadata_files, 1);
        assert_eq!(summary.rewritten, 1);
        assert!(summary.warnings.is_empty());

        let out_day = output.join("RDNP/1850/05/05");
        let xml = fs::read_to_string(out_day.join("WO1_RDNP_1850_05_05-0001-001_metadata.xml"))
            .expect("xml");
        assert_eq!(xml, metadata("0000095", "1850-05-05"));
        assert_eq!(
            fs::read_to_string(out_day.join("WO1_RDNP_1850_05_05-0001-001.txt")).expect("txt"),
            "THE PROSPECTS"
        );
    }

    #[test]
    fn skipped_files_surface_as_count_warnings() {
        let tmp = tempdir().expect("tempdir");
        let input = tmp.path().join("in");
        write(&input.join("ANJO/a_metadata.xml"), &metadata("ANJO", "1876-08-24"));
        write(&input.join("ANJO/a.txt"), "a");
        write(&input.join("ANJO/b_metadata.xml"), &metadata("ANJO", "1876-08-22"));
        write(&input.join("ANJO/b.txt"), "b");
        let (input, output) = prepare_dirs(&input, &tmp.path().join("out")).expect("prepare");

        let summary = run(&input, &output, &lookup(), false).expect("run");
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.rewritten, 1);
        assert_eq!(summary.warnings.len(), 2);
        assert!(!output.join("ANJO/a.txt").exists());
        assert!(output.join("ANJO/b.txt").is_file());
    }

    #[test]
    fn missing_plaintext_is_fatal() {
        let tmp = tempdir().expect("tempdir");
        let input = tmp.path().join("in");
        write(&input.join("RDNP/x_metadata.xml"), &metadata("RDNP", "1850-05-05"));
        let (input, output) = prepare_dirs(&input, &tmp.path().join("out")).expect("prepare");

        let err = run(&input, &output, &lookup(), false).expect_err("no plaintext");
        assert!(format!("{err:#}").contains("Failed to find plaintext file"));
    }

    #[test]
    fn output_must_start_empty() {
        let tmp = tempdir().expect("tempdir");
        let input = tmp.path().join("in");
        fs::create_dir_all(&input).expect("mkdir");
        write(&tmp.path().join("out/stale.txt"), "x");

        let err = prepare_dirs(&input, &tmp.path().join("out")).expect_err("non-empty");
        assert!(matches!(
            err.downcast_ref::<WranglerError>(),
            Some(WranglerError::InvalidLayout(_))
        ));
    }

    #[test]
    fn dry_run_writes_nothing() {
        let tmp = tempdir().expect("tempdir");
        let input = tmp.path().join("in");
        write(&input.join("RDNP/x_metadata.xml"), &metadata("RDNP", "1850-05-05"));
        write(&input.join("RDNP/x.txt"), "x");
        let (input, output) = prepare_dirs(&input, &tmp.path().join("out")).expect("prepare");

        let summary = run(&input, &output, &lookup(), true).expect("dry run");
        assert_eq!(summary.rewritten, 1);
        assert_eq!(fsutil::count_files(&output).expect("count"), 0);
    }
}
