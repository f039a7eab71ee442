use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const UNMATCHED_FILE: &str = "jw_unmatched.txt";
pub const IGNORED_FILE: &str = "jw_ignored.txt";
pub const DUPLICATES_FILE: &str = "jw_duplicates.txt";

/// Plain-text manifests written into a run's working directory.
#[derive(Debug, Clone)]
pub struct Manifests {
    pub unmatched: PathBuf,
    pub ignored: PathBuf,
    pub duplicates: PathBuf,
}

impl Manifests {
    pub fn in_dir(working_dir: &Path) -> Self {
        Self {
            unmatched: working_dir.join(UNMATCHED_FILE),
            ignored: working_dir.join(IGNORED_FILE),
            duplicates: working_dir.join(DUPLICATES_FILE),
        }
    }
}

/// Replaces `path` with one line per entry.
pub fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut body = lines.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))
}

/// Appends one line; the file is opened and closed on every call so a
/// crash never loses more than the event in flight.
pub fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(format!("{line}\n").as_bytes())
        .with_context(|| format!("failed to append to {}", path.display()))?;
    Ok(())
}

pub fn count_lines(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Ok(0);
    }
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(raw.lines().filter(|l| !l.is_empty()).count())
}
