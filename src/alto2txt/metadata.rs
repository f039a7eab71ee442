use crate::alto2txt::lookup::TitleLookup;
use chrono::NaiveDate;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static PUBLICATION_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<publication\b[^>]*>").expect("static publication pattern compiles")
});
static ID_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\sid\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')"#)
        .expect("static id pattern compiles")
});
static ISSUE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<issue\b[^>]*>.*?<date\b[^>]*>(?P<date>[^<]*)</date>")
        .expect("static issue date pattern compiles")
});

/// A metadata document with its publication id replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub title_code: String,
    pub nlp: String,
    pub xml: String,
}

/// Why a metadata file was left out of the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoPublication,
    NoTitleCode,
    NoIssueDate,
    BadDate(String),
    UnknownTitle(String),
    NoCatalogCode { title: String, date: NaiveDate },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPublication => write!(f, "failed to find publication element"),
            Self::NoTitleCode => write!(f, "failed to find publication id attribute"),
            Self::NoIssueDate => write!(f, "failed to find issue/date element"),
            Self::BadDate(raw) => write!(f, "unparseable issue date {raw:?}"),
            Self::UnknownTitle(title) => write!(f, "title code {title} is not in the lookup"),
            Self::NoCatalogCode { title, date } => {
                write!(f, "no catalog code for {title} on {date}")
            }
        }
    }
}

/// Swaps the four-letter title code in `<publication id="…">` for the
/// catalog code valid on the issue date. Only the attribute value changes;
/// every other byte of `xml` is kept.
pub fn rewrite_publication_id(xml: &str, lookup: &TitleLookup) -> Result<Rewrite, SkipReason> {
    let tag = PUBLICATION_TAG.find(xml).ok_or(SkipReason::NoPublication)?;
    let id = ID_ATTRIBUTE
        .captures(tag.as_str())
        .and_then(|caps| caps.name("dq").or_else(|| caps.name("sq")))
        .ok_or(SkipReason::NoTitleCode)?;
    let title_code = id.as_str().to_string();

    let raw_date = ISSUE_DATE
        .captures(&xml[tag.end()..])
        .and_then(|caps| caps.name("date"))
        .map(|m| m.as_str().trim())
        .ok_or(SkipReason::NoIssueDate)?;
    let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
        .map_err(|_| SkipReason::BadDate(raw_date.to_string()))?;

    if !lookup.contains_title(&title_code) {
        return Err(SkipReason::UnknownTitle(title_code));
    }
    let nlp = lookup
        .resolve(&title_code, date)
        .ok_or_else(|| SkipReason::NoCatalogCode {
            title: title_code.clone(),
            date,
        })?
        .to_string();

    let value_start = tag.start() + id.start();
    let value_end = tag.start() + id.end();
    let xml = format!("{}{}{}", &xml[..value_start], nlp, &xml[value_end..]);
    Ok(Rewrite {
        title_code,
        nlp,
        xml,
    })
}
