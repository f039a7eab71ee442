use crate::error::WranglerError;
use crate::wrangler::dialect::{self, Dialect};
use crate::wrangler::probe::{self, Granularity, OutputTree};
use std::path::{Path, PathBuf};

/// What the next merge step should do for the head of a stub's paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergePlan {
    /// Copy a whole input directory (title, year, month or day) into a
    /// target that does not exist yet.
    CopyDir {
        from: String,
        to: PathBuf,
        granularity: Granularity,
    },
    /// Copy one file into `to_dir`. The directory may still be missing for
    /// lsidyv inputs; the dispatcher creates it first.
    CopyFile { from: String, to_dir: PathBuf },
    /// A file of the same name is already in place.
    Collision { from: String, target_file: PathBuf },
}

impl MergePlan {
    /// Input prefix covered by this step. Single-file steps cover exactly
    /// one path and return `None`.
    pub fn consumed_prefix(&self) -> Option<&str> {
        match self {
            Self::CopyDir { from, .. } => Some(from),
            Self::CopyFile { .. } | Self::Collision { .. } => None,
        }
    }
}

fn single_file_plan<T: OutputTree + ?Sized>(tree: &T, path: &str, to_dir: PathBuf) -> MergePlan {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let target_file = to_dir.join(file_name);
    if tree.is_file(&target_file) {
        MergePlan::Collision {
            from: path.to_string(),
            target_file,
        }
    } else {
        MergePlan::CopyFile {
            from: path.to_string(),
            to_dir,
        }
    }
}

/// Finds the largest unit of `path` that can be merged in one step, by
/// looking for the coarsest output directory that does not exist yet.
///
/// Once a directory exists in the output, no sibling input ever copies it
/// again, so each title/year/month/day boundary is crossed once per run.
pub fn determine_from_to<T: OutputTree + ?Sized>(
    path: &str,
    output_root: &Path,
    tree: &T,
) -> Result<MergePlan, WranglerError> {
    let unresolved = || WranglerError::UnresolvedStandardization(path.to_string());
    let matched = dialect::classify(path).ok_or_else(unresolved)?;

    if matched.dialect == Dialect::Lsidyv {
        let to_dir = probe::target_dir(path, Granularity::Day, output_root)?;
        if !tree.is_dir(&to_dir) {
            return Ok(MergePlan::CopyFile {
                from: path.to_string(),
                to_dir,
            });
        }
        return Ok(single_file_plan(tree, path, to_dir));
    }

    for granularity in Granularity::COARSE_TO_FINE {
        if probe::exists(tree, path, granularity, output_root)? {
            continue;
        }
        let len = matched
            .copy_from_len(granularity)
            .ok_or_else(unresolved)?;
        return Ok(MergePlan::CopyDir {
            from: path[..len].to_string(),
            to: probe::target_dir(path, granularity, output_root)?,
            granularity,
        });
    }

    let to_dir = probe::target_dir(path, Granularity::Day, output_root)?;
    Ok(single_file_plan(tree, path, to_dir))
}
