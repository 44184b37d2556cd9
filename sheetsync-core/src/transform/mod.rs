//! Row transformation between raw sheet values and entities.
//!
//! - [`hyperlink`] - Hyperlink formula and link JSON parsing
//! - [`tools`] - Flat tool rows
//! - [`patterns`] - Sectioned pattern rows with inherited names
//! - [`format`] - Entity to row formatting for appends

pub mod format;
pub mod hyperlink;
pub mod patterns;
pub mod tools;

pub use format::format_row;
pub use hyperlink::{normalize_cell, parse_hyperlink_formula, parse_link_cell, serialize_link};
pub use patterns::transform_patterns;
pub use tools::{normalize_url, split_disciplines, transform_tools};

use crate::models::{Entity, EntityKind};

/// Raw sheet rows, one `Vec` of cell strings per row.
pub type Rows = Vec<Vec<String>>;

/// Maps raw sheet rows into entities of a given kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowTransformer;

impl RowTransformer {
    /// Transforms data rows (header already removed).
    pub fn transform(kind: EntityKind, rows: &[Vec<String>]) -> Vec<Entity> {
        match kind {
            EntityKind::Tool => transform_tools(rows).into_iter().map(Entity::from).collect(),
            EntityKind::Pattern => transform_patterns(rows)
                .into_iter()
                .map(Entity::from)
                .collect(),
        }
    }

    /// Transforms a full sheet, skipping its header row.
    pub fn transform_sheet(kind: EntityKind, rows: &[Vec<String>]) -> Vec<Entity> {
        match rows.split_first() {
            Some((_header, data)) => Self::transform(kind, data),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_sheet_skips_header() {
        let rows = vec![
            vec!["Name".to_string(), "Description".to_string(), "URL".to_string(), "Source".to_string()],
            vec!["Miro".to_string(), "Boards".to_string(), "miro.com".to_string(), "external".to_string()],
        ];
        let entities = RowTransformer::transform_sheet(EntityKind::Tool, &rows);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name(), "Miro");
    }

    #[test]
    fn test_transform_sheet_empty() {
        assert!(RowTransformer::transform_sheet(EntityKind::Pattern, &[]).is_empty());
    }
}
