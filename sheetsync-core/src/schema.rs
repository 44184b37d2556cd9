//! Column layouts for the sheets backing each entity kind.
//!
//! Rows are positional; these schemas name the positions once so the
//! transformers and the row formatters agree on them.

/// Column layout of the tools sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolColumns {
    /// Tool name.
    pub name: usize,
    /// Description.
    pub description: usize,
    /// URL.
    pub url: usize,
    /// Listing source.
    pub source: usize,
    /// Comma-separated disciplines.
    pub discipline: usize,
    /// Notes.
    pub notes: usize,
}

/// The tools sheet layout.
pub const TOOL_COLUMNS: ToolColumns = ToolColumns {
    name: 0,
    description: 1,
    url: 2,
    source: 3,
    discipline: 4,
    notes: 5,
};

impl ToolColumns {
    /// Minimum number of cells a row needs to be considered.
    pub const MIN_CELLS: usize = 4;

    /// Total number of columns written when appending a tool.
    pub const WIDTH: usize = 6;

    /// Source value marking rows that are published.
    pub const EXTERNAL_SOURCE: &'static str = "external";
}

/// Column layout of the patterns sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternColumns {
    /// Pattern name (blank inherits the previous name).
    pub name: usize,
    /// Category.
    pub category: usize,
    /// Description.
    pub description: usize,
    /// Where the pattern applies.
    pub where_: usize,
    /// Link columns, in order.
    pub links: [usize; 3],
}

/// The patterns sheet layout.
pub const PATTERN_COLUMNS: PatternColumns = PatternColumns {
    name: 0,
    category: 1,
    description: 2,
    where_: 3,
    links: [4, 5, 6],
};

impl PatternColumns {
    /// Total number of columns written when appending a pattern.
    pub const WIDTH: usize = 7;
}

/// Returns the trimmed cell at `index`, or an empty string when the row is short.
pub fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map_or("", |c| c.trim())
}
