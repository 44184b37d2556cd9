//! Entity kinds and the tagged entity wrapper.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{PatternEntity, ToolEntity};
use crate::error::CoreError;

// ============================================================================
// Entity Kind
// ============================================================================

/// The kinds of entity the client knows how to read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Flat tool listing.
    Tool,
    /// Sectioned pattern listing.
    Pattern,
}

impl EntityKind {
    /// Returns all entity kinds.
    pub fn all() -> &'static [EntityKind] {
        &[EntityKind::Tool, EntityKind::Pattern]
    }

    /// Returns the lowercase singular name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tool => "tool",
            Self::Pattern => "pattern",
        }
    }

    /// Returns the persisted cache key for transformed entities of this kind.
    pub fn cache_key(&self) -> &'static str {
        match self {
            Self::Tool => "tools",
            Self::Pattern => "patterns",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tool" | "tools" => Ok(Self::Tool),
            "pattern" | "patterns" => Ok(Self::Pattern),
            other => Err(CoreError::UnknownKind(other.to_string())),
        }
    }
}

// ============================================================================
// Entity
// ============================================================================

/// A transformed entity of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    /// A tool entry.
    Tool(ToolEntity),
    /// A pattern entry or section header.
    Pattern(PatternEntity),
}

impl Entity {
    /// Returns the kind of this entity.
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Tool(_) => EntityKind::Tool,
            Self::Pattern(_) => EntityKind::Pattern,
        }
    }

    /// Returns the display name of this entity.
    pub fn name(&self) -> &str {
        match self {
            Self::Tool(tool) => &tool.name,
            Self::Pattern(pattern) => &pattern.name,
        }
    }

    /// Returns the tool if this is a tool entity.
    pub fn as_tool(&self) -> Option<&ToolEntity> {
        match self {
            Self::Tool(tool) => Some(tool),
            Self::Pattern(_) => None,
        }
    }

    /// Returns the pattern if this is a pattern entity.
    pub fn as_pattern(&self) -> Option<&PatternEntity> {
        match self {
            Self::Pattern(pattern) => Some(pattern),
            Self::Tool(_) => None,
        }
    }
}

impl From<ToolEntity> for Entity {
    fn from(tool: ToolEntity) -> Self {
        Self::Tool(tool)
    }
}

impl From<PatternEntity> for Entity {
    fn from(pattern: PatternEntity) -> Self {
        Self::Pattern(pattern)
    }
}
