//! Listing extraction
//!
//! Scans the full listing text (not line by line) for entries shaped like
//! `<digits>, // <Title> (<Year>)[ - <qualifier>]`. Anything else is skipped.

use once_cell::sync::Lazy;
use regex::Regex;

static ENTRY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\s*,\s*//[ \t]*([^\r\n]*)").expect("entry pattern is valid")
});

static YEAR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((\d{4})\)").expect("year pattern is valid"));

static YEAR_STRIP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\(\d{4}\)").expect("year strip pattern is valid"));

/// One listing entry: the identifier it claims plus the title context from its comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    /// Identifier as written in the listing
    pub current_id: String,
    /// Comment text after `//`, trailing whitespace trimmed
    pub full_comment: String,
    /// Title without year or qualifier, used for comparison and search
    pub clean_title: String,
    /// Four-digit year from the comment, if present
    pub year: Option<String>,
}

impl CandidateRecord {
    /// Build a record from an identifier and its comment text
    pub fn from_comment(current_id: impl Into<String>, comment: &str) -> Self {
        let full_comment = comment.trim_end().to_string();
        let year = YEAR_REGEX
            .captures(&full_comment)
            .map(|caps| caps[1].to_string());

        Self {
            current_id: current_id.into(),
            clean_title: clean_title(&full_comment),
            full_comment,
            year,
        }
    }
}

/// Strip the parenthetical year and any ` - ` qualifier suffix
fn clean_title(comment: &str) -> String {
    let without_year = YEAR_STRIP_REGEX.replace_all(comment, "");
    let title = match without_year.find(" - ") {
        Some(idx) => &without_year[..idx],
        None => &without_year[..],
    };
    title.trim().to_string()
}

/// Extract candidate records in listing order
pub fn extract_records(text: &str) -> Vec<CandidateRecord> {
    let records: Vec<CandidateRecord> = ENTRY_REGEX
        .captures_iter(text)
        .map(|caps| CandidateRecord::from_comment(&caps[1], &caps[2]))
        .collect();

    tracing::debug!(count = records.len(), "Extracted listing entries");
    records
}
