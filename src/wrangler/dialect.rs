use crate::error::WranglerError;
use crate::wrangler::manifest;
use crate::wrangler::probe::Granularity;
use anyhow::Result;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const LEN_TITLE_CODE: usize = 4;
pub const LEN_DAY: usize = 2;

static SERVICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| nested_pattern(false, "service"));
static SERVICE_SUBDAY_PATTERN: LazyLock<Regex> = LazyLock::new(|| nested_pattern(true, "service"));
static MASTER_PATTERN: LazyLock<Regex> = LazyLock::new(|| nested_pattern(false, "master"));
static MASTER_SUBDAY_PATTERN: LazyLock<Regex> = LazyLock::new(|| nested_pattern(true, "master"));
static LSIDYV_PATTERN: LazyLock<Regex> = LazyLock::new(|| lsidyv_pattern(LEN_TITLE_CODE));
static LSIDYV_ANOMALY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| lsidyv_pattern(LEN_TITLE_CODE + 1));
static STANDARD_LEAF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|/)[A-Z]{4}/[0-9]{4}/[0-9]{2}/[0-9]{2}$")
        .expect("static standard leaf pattern compiles")
});
static SUBDAY_SUFFIX_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{2}_[SVsv]$").expect("static sub-day pattern compiles")
});
static OSMAPS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"OSMaps.*?(\.shp|/metadata)\.xml$").expect("static OSMaps pattern compiles")
});

fn nested_pattern(subday: bool, leaf: &str) -> Regex {
    let subday = if subday { "(?P<subday>_[SVsv])" } else { "" };
    let pattern = format!(
        r"(?P<title>[A-Za-z]{{4}})/(?P<year>[0-9]{{4}})/(?P<month>[0-9]{{2}})/(?P<day>[0-9]{{2}}){subday}/(?i:{leaf})/"
    );
    Regex::new(&pattern).expect("static dialect pattern compiles")
}

fn lsidyv_pattern(title_len: usize) -> Regex {
    let pattern =
        format!(r"lsidyv[a-z0-9]{{4}}[a-z0-9]?[a-z0-9]?/(?P<title>[A-Z]{{{title_len}}})-");
    Regex::new(&pattern).expect("static lsidyv pattern compiles")
}

/// Known vendor layouts, in classification priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dialect {
    Service,
    ServiceSubday,
    Master,
    MasterSubday,
    Lsidyv,
    OsMaps,
}

impl Dialect {
    pub const PRIORITY: [Dialect; 6] = [
        Dialect::Service,
        Dialect::ServiceSubday,
        Dialect::Master,
        Dialect::MasterSubday,
        Dialect::Lsidyv,
        Dialect::OsMaps,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Service => "SERVICE",
            Self::ServiceSubday => "SERVICE_SUBDAY",
            Self::Master => "MASTER",
            Self::MasterSubday => "MASTER_SUBDAY",
            Self::Lsidyv => "LSIDYV",
            Self::OsMaps => "OSMAPS",
        }
    }

    /// True for the `service`/`master` wrapper layouts.
    pub fn is_wrapped(self) -> bool {
        matches!(
            self,
            Self::Service | Self::ServiceSubday | Self::Master | Self::MasterSubday
        )
    }

    pub fn is_subday(self) -> bool {
        matches!(self, Self::ServiceSubday | Self::MasterSubday)
    }

    fn pattern(self) -> &'static Regex {
        match self {
            Self::Service => &SERVICE_PATTERN,
            Self::ServiceSubday => &SERVICE_SUBDAY_PATTERN,
            Self::Master => &MASTER_PATTERN,
            Self::MasterSubday => &MASTER_SUBDAY_PATTERN,
            Self::Lsidyv => &LSIDYV_PATTERN,
            Self::OsMaps => &OSMAPS_PATTERN,
        }
    }

    pub fn is_match(self, path: &str) -> bool {
        self.pattern().is_match(path)
    }

    fn match_path(self, path: &str) -> Option<DialectMatch> {
        match self {
            Self::Service | Self::ServiceSubday | Self::Master | Self::MasterSubday => {
                let caps = self.pattern().captures(path)?;
                let title = caps.name("title")?;
                let year = caps.name("year")?;
                let month = caps.name("month")?;
                let day = caps.name("day")?;
                let day_end = caps.name("subday").map_or(day.end(), |s| s.end());
                Some(DialectMatch {
                    dialect: self,
                    stub_end: title.end(),
                    key: Some(StandardizedKey::new(
                        title.as_str(),
                        year.as_str(),
                        month.as_str(),
                        day.as_str(),
                    )),
                    segment_ends: Some([title.end(), year.end(), month.end(), day_end]),
                })
            }
            Self::Lsidyv => {
                let found = self.pattern().find(path)?;
                let key = lsidyv_key(path)?;
                Some(DialectMatch {
                    dialect: self,
                    stub_end: found.end(),
                    key: Some(key),
                    segment_ends: None,
                })
            }
            Self::OsMaps => {
                let found = self.pattern().find(path)?;
                Some(DialectMatch {
                    dialect: self,
                    stub_end: found.start() + LEN_TITLE_CODE,
                    key: None,
                    segment_ends: None,
                })
            }
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Canonical `TITLE/YYYY/MM/DD/` location of an input file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StandardizedKey {
    title: String,
    year: String,
    month: String,
    day: String,
}

impl StandardizedKey {
    fn new(title: &str, year: &str, month: &str, day: &str) -> Self {
        Self {
            title: title.to_ascii_uppercase(),
            year: year.to_string(),
            month: month.to_string(),
            day: day.to_string(),
        }
    }

    /// The key truncated to `granularity`, with a trailing separator.
    pub fn subdir(&self, granularity: Granularity) -> String {
        let parts = [&self.title, &self.year, &self.month, &self.day];
        let mut out = String::new();
        for part in parts.iter().take(granularity.depth()) {
            out.push_str(part);
            out.push('/');
        }
        out
    }
}

impl fmt::Display for StandardizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.subdir(Granularity::Day))
    }
}

/// Result of recognising one input path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialectMatch {
    pub dialect: Dialect,
    /// Byte offset just past the stub (title code segment or `TITLE-` prefix).
    pub stub_end: usize,
    pub key: Option<StandardizedKey>,
    segment_ends: Option<[usize; 4]>,
}

impl DialectMatch {
    pub fn stub<'a>(&self, path: &'a str) -> &'a str {
        &path[..self.stub_end]
    }

    /// Byte length of the input prefix that holds everything at
    /// `granularity`, trailing separator included. The day segment keeps
    /// any sub-day suffix so the whole `DD_S/` directory is one unit.
    pub fn copy_from_len(&self, granularity: Granularity) -> Option<usize> {
        let ends = self.segment_ends?;
        Some(ends[granularity.depth() - 1] + 1)
    }
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

fn lsidyv_key(path: &str) -> Option<StandardizedKey> {
    let file_name = path.rsplit('/').next()?;
    let mut parts = file_name.split('-');
    let title = parts.next()?;
    let year = parts.next()?;
    let month = parts.next()?;
    let last = file_name.rsplit('-').next()?;
    let day = last.split('.').next()?.get(..LEN_DAY)?;

    if title.len() != LEN_TITLE_CODE
        || !is_digits(year, 4)
        || !is_digits(month, 2)
        || !is_digits(day, LEN_DAY)
    {
        return None;
    }
    Some(StandardizedKey::new(title, year, month, day))
}

/// The wrapper dialect whose `service`/`master` leaf is exactly `dir`
/// (given with a trailing separator), if any.
pub fn wrapper_dialect(dir: &str) -> Option<Dialect> {
    Dialect::PRIORITY
        .into_iter()
        .filter(|d| d.is_wrapped())
        .find(|d| d.pattern().find(dir).is_some_and(|m| m.end() == dir.len()))
}

/// True when `dir` (no trailing separator) ends in `TITLE/YYYY/MM/DD`.
pub fn is_standard_leaf(dir: &str) -> bool {
    STANDARD_LEAF_PATTERN.is_match(dir)
}

/// Strips a `_S`/`_V` suffix from a day directory name.
pub fn strip_subday_suffix(day_dir_name: &str) -> Option<&str> {
    SUBDAY_SUFFIX_PATTERN
        .is_match(day_dir_name)
        .then(|| &day_dir_name[..LEN_DAY])
}

/// Tries each dialect in priority order; first match wins.
pub fn classify(path: &str) -> Option<DialectMatch> {
    Dialect::PRIORITY
        .iter()
        .find_map(|dialect| dialect.match_path(path))
}

pub fn is_title_code_anomaly(path: &str) -> bool {
    LSIDYV_ANOMALY_PATTERN.is_match(path)
}

/// Drops the fifth character of an anomalous five-letter title code and
/// mirrors the path, relative to `input_dir`, under `working_dir`. Paths
/// outside `input_dir` are left alone.
pub fn fix_title_code_anomaly(path: &str, input_dir: &Path, working_dir: &Path) -> Option<PathBuf> {
    let found = LSIDYV_ANOMALY_PATTERN.find(path)?;
    let corrected = format!("{}{}", &path[..found.end() - 2], &path[found.end() - 1..]);
    let rel = Path::new(&corrected).strip_prefix(input_dir).ok()?;
    Some(working_dir.join(rel))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub path: String,
    pub matched: DialectMatch,
}

impl Classified {
    pub fn stub(&self) -> &str {
        self.matched.stub(&self.path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub classified: Vec<Classified>,
    pub unmatched: Vec<String>,
}

impl Classification {
    pub fn count_by_dialect(&self) -> BTreeMap<Dialect, usize> {
        let mut out = BTreeMap::new();
        for item in &self.classified {
            *out.entry(item.matched.dialect).or_insert(0) += 1;
        }
        out
    }
}

pub fn classify_paths(paths: Vec<String>) -> Classification {
    let mut out = Classification::default();
    for path in paths {
        match classify(&path) {
            Some(matched) => out.classified.push(Classified { path, matched }),
            None => out.unmatched.push(path),
        }
    }
    out
}

/// Classifies every path. Any unmatched path is a hard stop: the full
/// unmatched list is written to `unmatched_manifest` before failing.
pub fn classify_all(paths: Vec<String>, unmatched_manifest: &Path) -> Result<Vec<Classified>> {
    let total = paths.len();
    let classification = classify_paths(paths);

    let counts = classification.count_by_dialect();
    for dialect in Dialect::PRIORITY {
        let count = counts.get(&dialect).copied().unwrap_or(0);
        tracing::info!("Found {} files matching the {} pattern.", count, dialect);
    }

    if !classification.unmatched.is_empty() {
        manifest::write_lines(unmatched_manifest, &classification.unmatched)?;
        return Err(WranglerError::UnmatchedPaths {
            matched: classification.classified.len(),
            total,
            manifest: unmatched_manifest.to_path_buf(),
        }
        .into());
    }

    Ok(classification.classified)
}

/// Groups classified paths by stub; both stubs and paths come out sorted.
pub fn group_by_stub(classified: Vec<Classified>) -> BTreeMap<String, Vec<Classified>> {
    let mut groups: BTreeMap<String, Vec<Classified>> = BTreeMap::new();
    for item in classified {
        groups.entry(item.stub().to_string()).or_default().push(item);
    }
    for items in groups.values_mut() {
        items.sort_by(|a, b| a.path.cmp(&b.path));
    }
    groups
}
