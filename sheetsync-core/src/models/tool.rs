//! Tool entities.

use serde::{Deserialize, Serialize};

/// A tool listed in the tools sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolEntity {
    /// Position of the source row (header excluded).
    pub id: usize,
    /// Tool name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Absolute URL (always carries a scheme).
    pub url: String,
    /// Disciplines the tool applies to, in sheet order without duplicates.
    pub discipline: Vec<String>,
    /// Listing source (rows are kept only when this is `external`).
    pub source: String,
    /// Free-form notes.
    pub notes: String,
}
