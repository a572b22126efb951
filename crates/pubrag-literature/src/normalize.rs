//! Conversion of raw PubMed records into uniform article records.

use pubrag_core::{defaults, ArticleRecord, Error, Result};

use crate::raw::{collapse_whitespace, RawArticle, RawAuthor, RawPubDate, RawPubmedArticle};

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Build an [`ArticleRecord`] from a raw record.
///
/// Every field is extracted independently; a missing field becomes its
/// "not available" sentinel instead of failing the record.
///
/// # Errors
///
/// [`Error::Fetch`] when `id` is blank or the record has no article.
pub fn normalize(id: &str, raw: &RawPubmedArticle) -> Result<ArticleRecord> {
    let id = id.trim();
    if id.is_empty() {
        return Err(Error::Fetch("record has a blank identifier".to_string()));
    }
    let article = raw
        .article
        .as_ref()
        .ok_or_else(|| Error::Fetch(format!("PMID {}: record has no article", id)))?;

    let journal = article.journal.as_ref();

    Ok(ArticleRecord {
        id: id.to_string(),
        title: text_or(article.title.as_deref(), defaults::TITLE_NOT_AVAILABLE),
        abstract_text: abstract_text(article),
        authors: authors(&article.authors),
        journal: text_or(
            journal.and_then(|j| j.title.as_deref()),
            defaults::JOURNAL_NOT_AVAILABLE,
        ),
        keywords: keywords(raw),
        publication_date: journal
            .and_then(|j| j.pub_date.as_ref())
            .map(publication_date)
            .unwrap_or_else(|| defaults::DATE_NOT_AVAILABLE.to_string()),
        url: ArticleRecord::url_for(id),
    })
}

fn text_or(value: Option<&str>, sentinel: &str) -> String {
    value
        .map(collapse_whitespace)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| sentinel.to_string())
}

fn abstract_text(article: &RawArticle) -> String {
    collapse_whitespace(&article.abstract_segments.join(" "))
}

/// Render one author, preferring the personal name over a collective name.
fn author_name(author: &RawAuthor) -> Option<String> {
    let part = |p: &Option<String>| {
        p.as_deref()
            .map(collapse_whitespace)
            .filter(|s| !s.is_empty())
    };

    match (part(&author.fore_name), part(&author.last_name)) {
        (Some(fore), Some(last)) => Some(format!("{} {}", fore, last)),
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => part(&author.collective_name),
    }
}

fn authors(authors: &[RawAuthor]) -> String {
    let names: Vec<String> = authors.iter().filter_map(author_name).collect();
    if names.is_empty() {
        defaults::AUTHORS_NOT_AVAILABLE.to_string()
    } else {
        names.join(", ")
    }
}

fn keywords(raw: &RawPubmedArticle) -> String {
    let terms: Vec<String> = raw
        .mesh_headings
        .iter()
        .filter_map(|m| m.descriptor_name.as_deref())
        .map(collapse_whitespace)
        .filter(|t| !t.is_empty())
        .collect();
    if terms.is_empty() {
        defaults::KEYWORD_NOT_AVAILABLE.to_string()
    } else {
        terms.join(", ")
    }
}

/// Two-digit month from a number (`"3"`, `"03"`) or a name (`"Mar"`, `"March"`).
fn month_number(month: &str) -> Option<u32> {
    let month = month.trim();
    if let Ok(n) = month.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let prefix = month.get(..3)?.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .map(|i| i as u32 + 1)
}

fn day_number(day: &str) -> Option<u32> {
    day.trim()
        .parse::<u32>()
        .ok()
        .filter(|d| (1..=31).contains(d))
}

/// First standalone four-digit token, e.g. the year in `"2023 Jan-Feb"`.
fn medline_year(medline_date: &str) -> Option<&str> {
    medline_date
        .split(|c: char| !c.is_ascii_digit())
        .find(|token| token.len() == 4)
}

/// `YYYY-MM-DD`, with missing or unreadable month and day set to `01`.
fn publication_date(date: &RawPubDate) -> String {
    let year = date.year.as_deref().map(str::trim).filter(|y| !y.is_empty());

    match year {
        Some(year) => {
            let month = date.month.as_deref().and_then(month_number).unwrap_or(1);
            let day = date.day.as_deref().and_then(day_number).unwrap_or(1);
            format!("{}-{:02}-{:02}", year, month, day)
        }
        None => match date.medline_date.as_deref().and_then(medline_year) {
            Some(year) => format!("{}-01-01", year),
            None => defaults::DATE_NOT_AVAILABLE.to_string(),
        },
    }
}
