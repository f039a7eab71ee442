use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const DELIMITER: char = '|';
const COLUMNS: usize = 8;
const NLP_WIDTH: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub nlp: String,
}

impl TitleRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Title code -> catalog (NLP) code ranges, in file order.
#[derive(Debug, Clone, Default)]
pub struct TitleLookup {
    ranges: HashMap<String, Vec<TitleRange>>,
}

fn parse_lookup_date(day: &str, month: &str, year: &str) -> Result<NaiveDate> {
    let day = format!("{:0>2}", day.trim());
    let month: String = month.trim().chars().take(3).collect();
    let raw = format!("{day}-{month}-{}", year.trim());
    NaiveDate::parse_from_str(&raw, "%d-%b-%Y").with_context(|| format!("invalid date {raw}"))
}

impl TitleLookup {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read title lookup {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid title lookup {}", path.display()))
    }

    /// Parses the lookup table; the first line is a header.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut lookup = Self::default();
        for (index, line) in raw.lines().enumerate().skip(1) {
            if line.trim().is_empty() {
                continue;
            }
            let row: Vec<&str> = line.split(DELIMITER).collect();
            if row.len() < COLUMNS {
                bail!(
                    "line {}: expected {COLUMNS} columns, found {}",
                    index + 1,
                    row.len()
                );
            }
            let start = parse_lookup_date(row[2], row[3], row[4])
                .with_context(|| format!("line {}: start date", index + 1))?;
            let end = parse_lookup_date(row[5], row[6], row[7])
                .with_context(|| format!("line {}: end date", index + 1))?;
            if start > end {
                return Err(anyhow!(
                    "line {}: invalid date interval {start} to {end}",
                    index + 1
                ));
            }
            let nlp = format!("{:0>width$}", row[1].trim(), width = NLP_WIDTH);
            lookup
                .ranges
                .entry(row[0].trim().to_string())
                .or_default()
                .push(TitleRange { start, end, nlp });
        }
        Ok(lookup)
    }

    pub fn ranges(&self, title: &str) -> Option<&[TitleRange]> {
        self.ranges.get(title).map(Vec::as_slice)
    }

    pub fn contains_title(&self, title: &str) -> bool {
        self.ranges.contains_key(title)
    }

    /// Catalog code of the first range holding `date`, bounds inclusive.
    pub fn resolve(&self, title: &str, date: NaiveDate) -> Option<&str> {
        self.ranges(title)?
            .iter()
            .find(|range| range.contains(date))
            .map(|range| range.nlp.as_str())
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
