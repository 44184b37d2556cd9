//! Tools sheet transformation.

use tracing::debug;

use crate::models::ToolEntity;
use crate::schema::{cell, ToolColumns, TOOL_COLUMNS};

/// Transforms tool rows (header excluded) into tool entities.
///
/// Rows with fewer than [`ToolColumns::MIN_CELLS`] cells, or whose source
/// is not `external`, are dropped. Ids are the row positions.
pub fn transform_tools(rows: &[Vec<String>]) -> Vec<ToolEntity> {
    let tools: Vec<ToolEntity> = rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| tool_from_row(index, row))
        .collect();

    debug!(rows = rows.len(), tools = tools.len(), "Transformed tool rows");
    tools
}

fn tool_from_row(index: usize, row: &[String]) -> Option<ToolEntity> {
    if row.len() < ToolColumns::MIN_CELLS {
        return None;
    }

    let source = cell(row, TOOL_COLUMNS.source);
    if source != ToolColumns::EXTERNAL_SOURCE {
        return None;
    }

    Some(ToolEntity {
        id: index,
        name: cell(row, TOOL_COLUMNS.name).to_string(),
        description: cell(row, TOOL_COLUMNS.description).to_string(),
        url: normalize_url(cell(row, TOOL_COLUMNS.url)),
        discipline: split_disciplines(cell(row, TOOL_COLUMNS.discipline)),
        source: source.to_string(),
        notes: cell(row, TOOL_COLUMNS.notes).to_string(),
    })
}

/// Splits a comma-separated discipline cell, trimming and dropping empties.
pub fn split_disciplines(raw: &str) -> Vec<String> {
    let mut disciplines: Vec<String> = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if !disciplines.iter().any(|d| d == part) {
            disciplines.push(part.to_string());
        }
    }
    disciplines
}

/// Prefixes `https://` to URLs that carry no scheme.
pub fn normalize_url(raw: &str) -> String {
    let url = raw.trim();
    if url.is_empty() || url.contains("://") || url.starts_with("mailto:") {
        return url.to_string();
    }

    match url.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => format!("https://{url}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| (*c).to_string()).collect()
    }

    #[test]
    fn test_keeps_only_external_rows() {
        let rows = vec![
            row(&["Figma", "Design tool", "figma.com", "external", "UX, UI", "paid"]),
            row(&["Wiki", "Internal docs", "wiki.local", "internal", "All"]),
            row(&["Short", "x", "y"]),
        ];

        let tools = transform_tools(&rows);
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].id, 0);
        assert_eq!(tools[0].name, "Figma");
        assert_eq!(tools[0].url, "https://figma.com");
        assert_eq!(tools[0].discipline, vec!["UX", "UI"]);
        assert_eq!(tools[0].notes, "paid");
    }

    #[test]
    fn test_ids_follow_row_positions() {
        let rows = vec![
            row(&["A", "", "", "internal"]),
            row(&["B", "", "https://b.io", "external"]),
        ];
        let tools = transform_tools(&rows);
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].id, 1);
        assert!(tools[0].discipline.is_empty());
    }

    #[test]
    fn test_split_disciplines() {
        assert_eq!(split_disciplines(" a, ,b ,, a"), vec!["a", "b"]);
        assert!(split_disciplines("").is_empty());
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
        assert_eq!(normalize_url("//cdn.example.com"), "https://cdn.example.com");
        assert_eq!(normalize_url("mailto:a@b.c"), "mailto:a@b.c");
        assert_eq!(normalize_url("  "), "");
    }
}
