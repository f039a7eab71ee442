use crate::error::WranglerError;
use crate::wrangler::dialect::{self, Dialect};
use crate::wrangler::fsutil::{self, path_to_string};
use anyhow::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

fn failed(path: &Path, err: anyhow::Error) -> anyhow::Error {
    WranglerError::StandardizationFailed(format!("{}: {err:#}", path.display())).into()
}

/// Rewrites a freshly copied output subtree into the canonical
/// `TITLE/YYYY/MM/DD/` layout: vendor `service`/`master` wrappers are
/// unwrapped and sub-day `DD_S`/`DD_V` directories folded into `DD`.
///
/// Running it on an already canonical subtree changes nothing.
pub fn standardize_tree(output_subdir: &Path) -> Result<()> {
    let mut subday_dirs: BTreeSet<PathBuf> = BTreeSet::new();

    for subdir in fsutil::list_subdirs_deepest_first(output_subdir)? {
        let dir = format!("{}/", path_to_string(&subdir)?);

        if Dialect::Lsidyv.is_match(&dir) {
            return Err(WranglerError::NotImplemented {
                dialect: Dialect::Lsidyv.name(),
                path: dir,
            }
            .into());
        }

        let Some(wrapper) = dialect::wrapper_dialect(&dir) else {
            continue;
        };
        let Some(parent) = subdir.parent() else {
            continue;
        };
        fsutil::move_entries(&subdir, parent).map_err(|err| failed(&subdir, err))?;
        tracing::debug!("Unwrapped {} directory {}", wrapper, subdir.display());

        if wrapper.is_subday() {
            subday_dirs.insert(parent.to_path_buf());
        }
    }

    for day_dir in subday_dirs {
        let name = day_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let Some(day) = dialect::strip_subday_suffix(name) else {
            return Err(WranglerError::StandardizationFailed(format!(
                "failed to match subscripted subdirectory: {}",
                day_dir.display()
            ))
            .into());
        };
        let to_dir = day_dir.with_file_name(day);
        fsutil::move_entries(&day_dir, &to_dir).map_err(|err| failed(&day_dir, err))?;
        tracing::debug!(
            "Renamed sub-day directory {} to {}",
            day_dir.display(),
            to_dir.display()
        );
    }

    check_standard_layout(output_subdir)?;
    tracing::info!("Standardised output directory {}", output_subdir.display());
    Ok(())
}

/// Every directory that holds files must be a canonical day directory.
pub fn check_standard_layout(output_subdir: &Path) -> Result<()> {
    let leaves: BTreeSet<String> = fsutil::list_files(output_subdir)?
        .iter()
        .filter_map(|file| file.rsplit_once('/').map(|(dir, _)| dir.to_string()))
        .collect();
    for leaf in leaves {
        if !dialect::is_standard_leaf(&leaf) {
            return Err(WranglerError::StandardizationFailed(leaf).into());
        }
    }
    Ok(())
}
