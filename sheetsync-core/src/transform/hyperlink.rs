//! Hyperlink formula and serialized link parsing.
//!
//! Link cells come in two shapes: a raw `=HYPERLINK("url", "title")`
//! formula as typed into the sheet, or the link JSON that the fetcher
//! writes back into the cell after normalizing it. Anything else is
//! not a link.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::models::PatternLink;

/// Strict two-argument hyperlink formula. String literals may contain
/// doubled quotes, which is how the sheet escapes a literal quote.
static HYPERLINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^=(?i:HYPERLINK)\(\s*"((?:[^"]|"")*)"\s*,\s*"((?:[^"]|"")*)"\s*\)$"#)
        .expect("Invalid regex")
});

/// Parses a `=HYPERLINK("url", "title")` formula.
///
/// Only the exact two-argument form with string literals matches. Missing
/// or extra arguments, trailing content, an empty URL, or plain text all
/// yield `None`.
pub fn parse_hyperlink_formula(s: &str) -> Option<PatternLink> {
    let caps = HYPERLINK_RE.captures(s.trim())?;
    let url = caps.get(1)?.as_str().replace("\"\"", "\"");
    let title = caps.get(2)?.as_str().replace("\"\"", "\"");

    if url.trim().is_empty() {
        return None;
    }

    Some(PatternLink::new(url.trim(), title.trim()))
}

/// Serializes a link into the JSON form stored in normalized cells.
pub fn serialize_link(link: &PatternLink) -> String {
    serde_json::json!({ "url": link.url, "title": link.title }).to_string()
}

/// Rewrites a raw cell value, replacing hyperlink formulas with link JSON.
///
/// Cells that are not hyperlink formulas are returned unchanged.
pub fn normalize_cell(raw: &str) -> String {
    match parse_hyperlink_formula(raw) {
        Some(link) => serialize_link(&link),
        None => raw.to_string(),
    }
}

/// Parses a link cell into zero or more links.
///
/// Accepts serialized link JSON (an object or an array of objects) or a raw
/// hyperlink formula. Malformed cells are skipped.
pub fn parse_link_cell(cell: &str) -> Vec<PatternLink> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Vec::new();
    }

    if let Some(link) = parse_hyperlink_formula(cell) {
        return vec![link];
    }

    let parsed = if cell.starts_with('[') {
        serde_json::from_str::<Vec<PatternLink>>(cell)
    } else if cell.starts_with('{') {
        serde_json::from_str::<PatternLink>(cell).map(|link| vec![link])
    } else {
        debug!(cell = %cell, "Cell is not a link");
        return Vec::new();
    };

    match parsed {
        Ok(links) => links
            .into_iter()
            .filter(|link| !link.url.trim().is_empty())
            .collect(),
        Err(e) => {
            debug!(error = %e, "Skipping malformed link JSON");
            Vec::new()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
