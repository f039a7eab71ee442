use crate::error::WranglerError;
use crate::wrangler::manifest::Manifests;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const LOG_FILE: &str = "jw.log";
const WORKING_SUBDIR_FORMAT: &str = "jw_%Y-%m-%d_%Hh-%Mm-%Ss";

/// Resolved directories for one wrangling run.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Fresh per-run subdirectory of the working root.
    pub working_dir: PathBuf,
    pub manifests: Manifests,
    pub log_file: PathBuf,
}

fn canonical(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).with_context(|| format!("failed to resolve {}", path.display()))
}

fn ensure_dir(path: &Path) -> Result<PathBuf> {
    fs::create_dir_all(path).with_context(|| format!("failed to create {}", path.display()))?;
    canonical(path)
}

fn overlaps(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

/// Creates `jw_<timestamp>` below `working_root`, suffixing `-N` when a
/// directory of that name is already there.
pub fn create_working_subdir(working_root: &Path) -> Result<PathBuf> {
    let stamp = chrono::Local::now()
        .format(WORKING_SUBDIR_FORMAT)
        .to_string();
    let mut candidate = working_root.join(&stamp);
    let mut counter = 1usize;
    while candidate.exists() {
        candidate = working_root.join(format!("{stamp}-{counter}"));
        counter += 1;
    }
    fs::create_dir_all(&candidate)
        .with_context(|| format!("failed to create {}", candidate.display()))?;
    Ok(candidate)
}

impl RunPaths {
    pub fn prepare(input: &Path, output: &Path, working_root: &Path) -> Result<Self> {
        if !input.is_dir() {
            return Err(WranglerError::InvalidInput(format!(
                "input directory does not exist: {}",
                input.display()
            ))
            .into());
        }
        let input_dir = canonical(input)?;
        let output_dir = ensure_dir(output)?;
        let working_root = ensure_dir(working_root)?;

        if overlaps(&input_dir, &output_dir) {
            return Err(WranglerError::InvalidLayout(format!(
                "input {} and output {} must not contain one another",
                input_dir.display(),
                output_dir.display()
            ))
            .into());
        }
        for (label, dir) in [("input", &input_dir), ("output", &output_dir)] {
            if working_root.starts_with(dir) {
                return Err(WranglerError::InvalidLayout(format!(
                    "working directory {} is inside the {label} directory {}",
                    working_root.display(),
                    dir.display()
                ))
                .into());
            }
        }

        let working_dir = create_working_subdir(&working_root)?;
        Ok(Self {
            input_dir,
            output_dir,
            manifests: Manifests::in_dir(&working_dir),
            log_file: working_dir.join(LOG_FILE),
            working_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn layout_error(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<WranglerError>(),
            Some(WranglerError::InvalidLayout(_))
        )
    }

    #[test]
    fn prepare_creates_output_and_working_subdir() {
        let tmp = tempdir().expect("tempdir");
        let input = tmp.path().join("in");
        fs::create_dir_all(&input).expect("mkdir");

        let paths = RunPaths::prepare(&input, &tmp.path().join("out"), &tmp.path().join("work"))
            .expect("prepare");
        assert!(paths.output_dir.is_dir());
        assert!(paths.working_dir.is_dir());
        let name = paths
            .working_dir
            .file_name()
            .and_then(|n| n.to_str())
            .expect("name");
        assert!(name.starts_with("jw_"), "{name}");
        assert_eq!(paths.log_file, paths.working_dir.join("jw.log"));
        assert_eq!(
            paths.manifests.duplicates,
            paths.working_dir.join("jw_duplicates.txt")
        );
    }

    #[test]
    fn missing_input_is_rejected() {
        let tmp = tempdir().expect("tempdir");
        let err = RunPaths::prepare(
            &tmp.path().join("absent"),
            &tmp.path().join("out"),
            tmp.path(),
        )
        .expect_err("missing input");
        assert!(matches!(
            err.downcast_ref::<WranglerError>(),
            Some(WranglerError::InvalidInput(_))
        ));
    }

    #[test]
    fn nested_layouts_are_rejected() {
        let tmp = tempdir().expect("tempdir");
        let input = tmp.path().join("in");
        fs::create_dir_all(&input).expect("mkdir");
        let work = tmp.path().join("work");

        let err = RunPaths::prepare(&input, &input.join("out"), &work).expect_err("out in input");
        assert!(layout_error(&err));

        let out = tmp.path().join("out");
        let err = RunPaths::prepare(&input, &out, &out.join("work")).expect_err("work in output");
        assert!(layout_error(&err));

        let err = RunPaths::prepare(&input, &out, &input).expect_err("work is input");
        assert!(layout_error(&err));
    }

    #[test]
    fn clashing_working_subdirs_get_a_counter() {
        let tmp = tempdir().expect("tempdir");
        let first = create_working_subdir(tmp.path()).expect("first");
        let second = create_working_subdir(tmp.path()).expect("second");
        assert_ne!(first, second);
        assert!(first.is_dir());
        assert!(second.is_dir());
    }
}
