//! Entity to row formatting for appends.

use crate::models::{Entity, PatternEntity, ToolEntity};
use crate::schema::{PatternColumns, ToolColumns, PATTERN_COLUMNS, TOOL_COLUMNS};

/// Formats an entity as a single row in its kind's column layout.
pub fn format_row(entity: &Entity) -> Vec<String> {
    match entity {
        Entity::Tool(tool) => format_tool(tool),
        Entity::Pattern(pattern) => format_pattern(pattern),
    }
}

fn format_tool(tool: &ToolEntity) -> Vec<String> {
    let mut row = vec![String::new(); ToolColumns::WIDTH];
    row[TOOL_COLUMNS.name] = tool.name.trim().to_string();
    row[TOOL_COLUMNS.description] = tool.description.trim().to_string();
    row[TOOL_COLUMNS.url] = tool.url.trim().to_string();
    row[TOOL_COLUMNS.source] = ToolColumns::EXTERNAL_SOURCE.to_string();
    row[TOOL_COLUMNS.discipline] = tool.discipline.join(", ");
    row[TOOL_COLUMNS.notes] = tool.notes.trim().to_string();
    row
}

fn format_pattern(pattern: &PatternEntity) -> Vec<String> {
    let mut row = vec![String::new(); PatternColumns::WIDTH];
    row[PATTERN_COLUMNS.name] = pattern.name.trim().to_string();
    if pattern.is_section {
        row.truncate(1);
        return row;
    }

    row[PATTERN_COLUMNS.category] = pattern.category.trim().to_string();
    row[PATTERN_COLUMNS.description] = pattern.description.trim().to_string();
    row[PATTERN_COLUMNS.where_] = pattern.where_.trim().to_string();
    for (column, link) in PATTERN_COLUMNS.links.iter().zip(&pattern.links) {
        row[*column] = link.to_formula();
    }
    row
}
