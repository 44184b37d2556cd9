//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use sheetsync_core::{Entity, EntityKind};

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for a fetch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitiesOutput<'a> {
    pub kind: EntityKind,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_datetime_opt")]
    pub last_loaded: Option<DateTime<Utc>>,
    pub entities: &'a [Entity],
}

// ============================================================================
// Serialization helpers
// ============================================================================

fn serialize_datetime_opt<S>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match dt {
        Some(dt) => s.serialize_str(&dt.to_rfc3339()),
        None => s.serialize_none(),
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize + ?Sized>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats a fetch result.
    ///
    /// `lastLoaded` is absent when the entities came from the cache.
    pub fn format_entities(
        &self,
        kind: EntityKind,
        entities: &[Entity],
        last_loaded: Option<DateTime<Utc>>,
    ) -> Result<String> {
        self.format(&EntitiesOutput {
            kind,
            count: entities.len(),
            last_loaded,
            entities,
        })
    }
}
