use crate::wrangler::manifest;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

/// Upper bound on `_ALT`, `_ALT2`, ... probing beside one target.
const MAX_ALT_ATTEMPTS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateOutcome {
    /// Byte-identical to a file already in the output.
    Duplicate { existing: PathBuf },
    /// Different content under the same name, kept beside the original.
    Conflict { alt_path: PathBuf },
}

pub fn hash_file(path: &Path) -> Result<String> {
    let file =
        fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)
        .with_context(|| format!("failed to hash {}", path.display()))?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Inserts `suffix` before the extension: `a/b/name.xml` -> `a/b/name_ALT.xml`.
pub fn alt_output_file(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    path.with_file_name(name)
}

fn numbered_suffix(suffix: &str, attempt: usize) -> String {
    if attempt == 1 {
        suffix.to_string()
    } else {
        format!("{suffix}{attempt}")
    }
}

fn record_duplicate(manifest_path: &Path, existing: &Path, input: &Path) -> Result<()> {
    manifest::append_line(
        manifest_path,
        &format!("{} duplicated at {}", existing.display(), input.display()),
    )
}

/// Settles a name collision between `input` and the file already at
/// `target_file`. Identical content is logged to the duplicates manifest;
/// different content is copied under an alternate name so nothing is lost.
/// In dry-run mode the manifest is still written but nothing is copied.
pub fn resolve_duplicate(
    input: &Path,
    target_file: &Path,
    duplicates_manifest: &Path,
    alt_suffix: &str,
    dry_run: bool,
) -> Result<DuplicateOutcome> {
    let input_hash = hash_file(input)?;
    if hash_file(target_file)? == input_hash {
        record_duplicate(duplicates_manifest, target_file, input)?;
        return Ok(DuplicateOutcome::Duplicate {
            existing: target_file.to_path_buf(),
        });
    }

    for attempt in 1..=MAX_ALT_ATTEMPTS {
        let alt_path = alt_output_file(target_file, &numbered_suffix(alt_suffix, attempt));
        if alt_path.is_file() {
            if hash_file(&alt_path)? == input_hash {
                record_duplicate(duplicates_manifest, &alt_path, input)?;
                return Ok(DuplicateOutcome::Duplicate { existing: alt_path });
            }
            continue;
        }

        tracing::warn!(
            "Renaming duplicate filename with distinct content: {} to {}",
            input.display(),
            alt_path.display()
        );
        if !dry_run {
            fs::copy(input, &alt_path).with_context(|| {
                format!("failed to copy {} to {}", input.display(), alt_path.display())
            })?;
        }
        return Ok(DuplicateOutcome::Conflict { alt_path });
    }

    anyhow::bail!(
        "no free alternate name for {} after {MAX_ALT_ATTEMPTS} attempts",
        target_file.display()
    )
}
