//! Pattern entities.
//!
//! Patterns are grouped into sections. A section header is itself a
//! [`PatternEntity`] with `is_section` set; every item that follows it
//! carries the header's name in `parent_title` until the next header.

use serde::{Deserialize, Serialize};

/// A titled link attached to a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatternLink {
    /// Link target.
    pub url: String,
    /// Display text.
    pub title: String,
}

impl PatternLink {
    /// Creates a new link.
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }

    /// Renders the link as a spreadsheet hyperlink formula.
    pub fn to_formula(&self) -> String {
        format!(
            "=HYPERLINK(\"{}\", \"{}\")",
            self.url.replace('"', "\"\""),
            self.title.replace('"', "\"\"")
        )
    }
}

/// A pattern item or section header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternEntity {
    /// Position of the source row (header excluded).
    pub id: usize,
    /// Pattern name, or the section title for headers.
    pub name: String,
    /// Category label.
    pub category: String,
    /// Where the pattern applies.
    #[serde(rename = "where")]
    pub where_: String,
    /// Description text.
    pub description: String,
    /// Reference links in sheet order, deduplicated.
    pub links: Vec<PatternLink>,
    /// True for section headers.
    pub is_section: bool,
    /// Title of the enclosing section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_title: Option<String>,
}

impl PatternEntity {
    /// Creates a section header.
    pub fn section(id: usize, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_section: true,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_carries_only_name() {
        let section = PatternEntity::section(3, "Navigation");
        assert!(section.is_section);
        assert_eq!(section.name, "Navigation");
        assert!(section.links.is_empty());
        assert!(section.parent_title.is_none());
    }

    #[test]
    fn test_where_field_uses_reserved_name() {
        let pattern = PatternEntity {
            name: "Tabs".to_string(),
            where_: "mobile".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&pattern).unwrap();
        assert_eq!(json["where"], "mobile");
        assert_eq!(json["isSection"], false);
        assert!(json.get("parentTitle").is_none());
    }

    #[test]
    fn test_formula_escapes_quotes() {
        let link = PatternLink::new("https://example.com", "Say \"hi\"");
        assert_eq!(
            link.to_formula(),
            "=HYPERLINK(\"https://example.com\", \"Say \"\"hi\"\"\")"
        );
    }
}
