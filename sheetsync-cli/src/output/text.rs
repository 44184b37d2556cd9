//! Text output formatting with colors.

use sheetsync_core::{Entity, EntityKind, PatternEntity, ToolEntity};

use crate::commands::check::CheckReport;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Formats a fetched listing, one block per entity.
    pub fn format_entities(&self, kind: EntityKind, entities: &[Entity]) -> String {
        if entities.is_empty() {
            return format!("{}\n", self.dim(&format!("No {} available", kind.cache_key())));
        }

        let mut out = String::new();
        for entity in entities {
            match entity {
                Entity::Tool(tool) => out.push_str(&self.format_tool(tool)),
                Entity::Pattern(pattern) => out.push_str(&self.format_pattern(pattern)),
            }
        }
        out
    }

    /// Formats one tool.
    pub fn format_tool(&self, tool: &ToolEntity) -> String {
        let mut lines = vec![format!("{}  {}", self.bold(&tool.name), self.cyan(&tool.url))];
        if !tool.description.is_empty() {
            lines.push(format!("  {}", tool.description));
        }
        if !tool.discipline.is_empty() {
            lines.push(format!("  {}", self.dim(&tool.discipline.join(", "))));
        }
        if !tool.notes.is_empty() {
            lines.push(format!("  {}", self.dim(&tool.notes)));
        }
        lines.join("\n") + "\n"
    }

    /// Formats a pattern; sections become headers and items are indented.
    pub fn format_pattern(&self, pattern: &PatternEntity) -> String {
        if pattern.is_section {
            return format!("\n{}\n{}\n", self.bold(&pattern.name), "─".repeat(40));
        }

        let indent = if pattern.parent_title.is_some() { "  " } else { "" };
        let mut title = format!("{indent}• {}", pattern.name);
        if !pattern.category.is_empty() {
            title.push_str(&format!(" {}", self.dim(&format!("({})", pattern.category))));
        }

        let mut lines = vec![title];
        if !pattern.description.is_empty() {
            lines.push(format!("{indent}  {}", pattern.description));
        }
        for link in &pattern.links {
            lines.push(format!("{indent}  {} {}", link.title, self.cyan(&link.url)));
        }
        lines.join("\n") + "\n"
    }

    /// Formats a check report.
    pub fn format_check(&self, report: &CheckReport, verbose: bool) -> String {
        let mut lines = Vec::new();

        let credentials = if report.credentials {
            self.ok("loaded")
        } else {
            self.fail("not found")
        };
        lines.push(format!("{:<15} {}", "Credentials", credentials));
        if verbose || !report.credentials {
            for path in &report.credential_paths {
                lines.push(format!("  - {}", self.dim(path)));
            }
        }

        for sheet in &report.sheets {
            let status = if sheet.spreadsheet_id.is_empty() {
                self.fail("not configured")
            } else {
                self.ok(&format!("{} {}", sheet.spreadsheet_id, sheet.range))
            };
            lines.push(format!("{:<15} {}", sheet.kind.cache_key(), status));
        }

        let token = match &report.token_error {
            None => self.ok("obtained"),
            Some(e) => self.fail(e),
        };
        lines.push(format!("{:<15} {}", "Access token", token));

        lines.join("\n") + "\n"
    }

    // ========================================================================
    // Color helpers
    // ========================================================================

    fn ok(&self, text: &str) -> String {
        self.paint(GREEN, &format!("✓ {text}"))
    }

    fn fail(&self, text: &str) -> String {
        self.paint(RED, &format!("✗ {text}"))
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}
