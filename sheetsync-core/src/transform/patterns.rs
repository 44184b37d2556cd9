//! Patterns sheet transformation.
//!
//! The sheet omits repeated values: a row with a single filled cell opens a
//! section, and an item row with a blank name continues the previous item.

use tracing::debug;

use super::hyperlink::parse_link_cell;
use crate::models::{PatternEntity, PatternLink};
use crate::schema::{cell, PATTERN_COLUMNS};

/// Transforms pattern rows (header excluded) into section and item entities.
pub fn transform_patterns(rows: &[Vec<String>]) -> Vec<PatternEntity> {
    let mut entities = Vec::new();
    let mut current_section: Option<String> = None;
    let mut last_name: Option<String> = None;

    for (index, row) in rows.iter().enumerate() {
        if let Some(title) = section_title(row) {
            entities.push(PatternEntity::section(index, title));
            current_section = Some(title.to_string());
            continue;
        }

        let name = cell(row, PATTERN_COLUMNS.name);
        if !name.is_empty() {
            last_name = Some(name.to_string());
        }
        let Some(name) = last_name.clone() else {
            debug!(row = index, "Skipping pattern row without a name");
            continue;
        };

        let category = cell(row, PATTERN_COLUMNS.category);
        let description = cell(row, PATTERN_COLUMNS.description);
        let links = collect_links(row);

        if category.is_empty() && description.is_empty() && links.is_empty() {
            continue;
        }

        entities.push(PatternEntity {
            id: index,
            name,
            category: category.to_string(),
            where_: cell(row, PATTERN_COLUMNS.where_).to_string(),
            description: description.to_string(),
            links,
            is_section: false,
            parent_title: current_section.clone(),
        });
    }

    debug!(rows = rows.len(), entities = entities.len(), "Transformed pattern rows");
    entities
}

/// Returns the header text when exactly one cell in the row is non-empty.
fn section_title(row: &[String]) -> Option<&str> {
    let mut filled = row.iter().map(|c| c.trim()).filter(|c| !c.is_empty());
    let first = filled.next()?;
    match filled.next() {
        Some(_) => None,
        None => Some(first),
    }
}

/// Gathers links from the link columns, dropping exact duplicates.
fn collect_links(row: &[String]) -> Vec<PatternLink> {
    let mut links: Vec<PatternLink> = Vec::new();
    for &column in &PATTERN_COLUMNS.links {
        for link in parse_link_cell(cell(row, column)) {
            if !links.contains(&link) {
                links.push(link);
            }
        }
    }
    links
}
