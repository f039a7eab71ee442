use crate::error::WranglerError;
use crate::wrangler::dialect::{self, StandardizedKey};
use std::path::{Path, PathBuf};

/// How much of the canonical key a merge step covers, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Granularity {
    Title,
    Year,
    Month,
    Day,
}

impl Granularity {
    pub const COARSE_TO_FINE: [Granularity; 4] = [
        Granularity::Title,
        Granularity::Year,
        Granularity::Month,
        Granularity::Day,
    ];

    /// Number of key segments covered.
    pub fn depth(self) -> usize {
        match self {
            Self::Title => 1,
            Self::Year => 2,
            Self::Month => 3,
            Self::Day => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
        }
    }
}

/// The planner's only view of the output tree.
pub trait OutputTree {
    fn is_dir(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsOutputTree;

impl OutputTree for FsOutputTree {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

pub fn standardize(path: &str) -> Result<StandardizedKey, WranglerError> {
    dialect::classify(path)
        .and_then(|m| m.key)
        .ok_or_else(|| WranglerError::UnresolvedStandardization(path.to_string()))
}

fn key_target_dir(
    key: &StandardizedKey,
    granularity: Granularity,
    output_root: &Path,
) -> PathBuf {
    output_root.join(key.subdir(granularity))
}

pub fn target_dir(
    path: &str,
    granularity: Granularity,
    output_root: &Path,
) -> Result<PathBuf, WranglerError> {
    let key = standardize(path)?;
    Ok(key_target_dir(&key, granularity, output_root))
}

pub fn exists<T: OutputTree + ?Sized>(
    tree: &T,
    path: &str,
    granularity: Granularity,
    output_root: &Path,
) -> Result<bool, WranglerError> {
    Ok(tree.is_dir(&target_dir(path, granularity, output_root)?))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::BTreeSet;

    /// In-memory stand-in for the output directory.
    #[derive(Debug, Default)]
    pub(crate) struct MemTree {
        dirs: BTreeSet<PathBuf>,
        files: BTreeSet<PathBuf>,
    }

    impl MemTree {
        pub(crate) fn mkdir(&mut self, path: &str) {
            let mut current = PathBuf::new();
            for component in Path::new(path).components() {
                current.push(component);
                self.dirs.insert(current.clone());
            }
        }

        pub(crate) fn touch(&mut self, path: &str) {
            let path = PathBuf::from(path);
            if let Some(parent) = path.parent() {
                self.mkdir(&parent.to_string_lossy());
            }
            self.files.insert(path);
        }
    }

    impl OutputTree for MemTree {
        fn is_dir(&self, path: &Path) -> bool {
            self.dirs.contains(&path.components().collect::<PathBuf>())
        }

        fn is_file(&self, path: &Path) -> bool {
            self.files.contains(&path.components().collect::<PathBuf>())
        }
    }

    const SERVICE: &str = "/data/JISC/WO1/BDPO/1894/11/07/service/WO1_BDPO_1894_11_07-0008-054.xml";
    const SUBDAY: &str = "/data/JISC/WO1/LEMR/1873/01/04_S/service/WO1_LEMR_1873_01_04_S-0001.xml";
    const LSIDYV: &str = "/data/JISC/JISC2/lsidyv100b3f/MOPT-1863-02-16.xml";

    #[test]
    fn target_dir_truncates_key_per_granularity() {
        let out = Path::new("/home/output");
        let want = [
            (Granularity::Title, "/home/output/BDPO/"),
            (Granularity::Year, "/home/output/BDPO/1894/"),
            (Granularity::Month, "/home/output/BDPO/1894/11/"),
            (Granularity::Day, "/home/output/BDPO/1894/11/07/"),
        ];
        for (granularity, expected) in want {
            let got = target_dir(SERVICE, granularity, out).expect("target");
            assert_eq!(got, PathBuf::from(expected));
        }
    }

    #[test]
    fn subday_suffix_is_dropped_from_target() {
        let out = Path::new("/home/output");
        let got = target_dir(SUBDAY, Granularity::Day, out).expect("target");
        assert_eq!(got, PathBuf::from("/home/output/LEMR/1873/01/04/"));
    }

    #[test]
    fn lsidyv_target_comes_from_filename() {
        let out = Path::new("/home/output");
        let got = target_dir(LSIDYV, Granularity::Day, out).expect("target");
        assert_eq!(got, PathBuf::from("/home/output/MOPT/1863/02/16/"));
    }

    #[test]
    fn unresolvable_paths_are_errors() {
        let err = standardize("/data/JISC/OSMaps/a.shp.xml").expect_err("osmaps has no key");
        assert!(matches!(err, WranglerError::UnresolvedStandardization(_)));
        assert!(standardize("/nowhere/file.xml").is_err());
    }

    #[test]
    fn exists_consults_the_tree() {
        let out = Path::new("/home/output");
        let mut tree = MemTree::default();
        assert!(!exists(&tree, SERVICE, Granularity::Title, out).expect("probe"));
        tree.mkdir("/home/output/BDPO");
        assert!(exists(&tree, SERVICE, Granularity::Title, out).expect("probe"));
        assert!(!exists(&tree, SERVICE, Granularity::Year, out).expect("probe"));
    }
}
