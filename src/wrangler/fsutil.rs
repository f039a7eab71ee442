use anyhow::{Context, Result, anyhow, bail};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn path_to_string(path: &Path) -> Result<String> {
    path.to_str()
        .map(ToOwned::to_owned)
        .ok_or_else(|| anyhow!("path is not valid UTF-8: {}", path.display()))
}

/// Every regular file below `dir`, sorted.
pub fn list_files(dir: &Path) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
        if entry.file_type().is_file() {
            out.push(path_to_string(entry.path())?);
        }
    }
    out.sort();
    Ok(out)
}

pub fn count_files(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut count = 0usize;
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
        if entry.file_type().is_file() {
            count += 1;
        }
    }
    Ok(count)
}

/// Every directory strictly below `dir`, deepest first.
pub fn list_subdirs_deepest_first(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .contents_first(true)
    {
        let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
        if entry.file_type().is_dir() {
            out.push(entry.into_path());
        }
    }
    Ok(out)
}

/// Copies the contents of `src` into `dst`, creating `dst` and any
/// intermediate directories. Existing files are overwritten.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<usize> {
    fs::create_dir_all(dst).with_context(|| format!("failed to create {}", dst.display()))?;
    let mut copied = 0usize;
    for entry in WalkDir::new(src)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("failed to walk {}", src.display()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .with_context(|| format!("{} escaped {}", entry.path().display(), src.display()))?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("failed to create {}", target.display()))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
            copied += 1;
        }
    }
    Ok(copied)
}

pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    if from == to {
        return Ok(());
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    match fs::rename(from, to) {
        Ok(_) => Ok(()),
        Err(rename_err) => {
            if matches!(
                rename_err.kind(),
                ErrorKind::CrossesDevices | ErrorKind::PermissionDenied
            ) && from.is_file()
            {
                fs::copy(from, to).with_context(|| {
                    format!("failed to copy {} to {}", from.display(), to.display())
                })?;
                fs::remove_file(from)
                    .with_context(|| format!("failed to remove {}", from.display()))?;
                Ok(())
            } else {
                Err(rename_err).with_context(|| {
                    format!("failed to move {} to {}", from.display(), to.display())
                })
            }
        }
    }
}

/// Moves every entry of `from_dir` into `to_dir` (created if missing) and
/// removes `from_dir`. Refuses to overwrite anything already in `to_dir`.
pub fn move_entries(from_dir: &Path, to_dir: &Path) -> Result<()> {
    if !to_dir.exists() {
        fs::create_dir(to_dir).with_context(|| format!("failed to create {}", to_dir.display()))?;
        tracing::info!("Created subdirectory at {}", to_dir.display());
    }

    let mut entries = fs::read_dir(from_dir)
        .with_context(|| format!("failed to read {}", from_dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("failed to read {}", from_dir.display()))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let target = to_dir.join(entry.file_name());
        if target.exists() {
            bail!(
                "cannot move {} into {}: {} already exists",
                entry.path().display(),
                to_dir.display(),
                target.display()
            );
        }
        move_file(&entry.path(), &target)?;
    }
    tracing::debug!(
        "Moved all entries from: {} to: {}",
        from_dir.display(),
        to_dir.display()
    );

    fs::remove_dir(from_dir).with_context(|| format!("failed to remove {}", from_dir.display()))?;
    tracing::debug!("Removed directory: {}", from_dir.display());
    Ok(())
}
