//! External station identifiers.
//!
//! Every drawn station carries an id that the renderer uses to match it
//! with live transit data. Ids come from a lookup table keyed by line and
//! station name; a few stations need ids that the table cannot express
//! (one physical station drawn at two schematic positions, for instance),
//! so callers can register overrides that take precedence.

use std::collections::HashMap;

use serde::Deserialize;

/// Resolves the external id of a station.
pub trait StationIdResolver {
    /// Returns the id of `station` on `line`, if known.
    fn resolve(&self, line: &str, station: &str) -> Option<String>;
}

/// One entry of the station-id file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StationIdEntry {
    name: String,
    metro_line: String,
    id: String,
}

/// A station-id table with optional overrides.
///
/// # Examples
///
/// ```
/// # use metromap_parser::{StationIdResolver, StationIdTable};
/// let json = r#"[
///     { "name": "Bank", "metroLine": "central", "id": "940GZZLUBNK" }
/// ]"#;
///
/// let mut table = StationIdTable::from_json(json).unwrap();
/// table.add_override("northern", "Bank", "940GZZLUBNK");
///
/// assert_eq!(table.resolve("central", "Bank").as_deref(), Some("940GZZLUBNK"));
/// assert_eq!(table.resolve("northern", "Bank").as_deref(), Some("940GZZLUBNK"));
/// assert_eq!(table.resolve("central", "Oval"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StationIdTable {
    ids: HashMap<(String, String), String>,
    overrides: HashMap<(String, String), String>,
}

impl StationIdTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a JSON array of `{ "name", "metroLine", "id" }` entries.
    ///
    /// Later entries for the same line and station replace earlier ones.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<StationIdEntry> = serde_json::from_str(json)?;
        let mut table = Self::new();
        for entry in entries {
            table.insert(&entry.metro_line, &entry.name, entry.id);
        }
        log::debug!(entries = table.ids.len(); "Loaded station id table");
        Ok(table)
    }

    pub fn insert(&mut self, line: &str, station: &str, id: impl Into<String>) {
        self.ids
            .insert((line.to_string(), station.to_string()), id.into());
    }

    /// Registers an id that wins over the table entry.
    pub fn add_override(&mut self, line: &str, station: &str, id: impl Into<String>) {
        self.overrides
            .insert((line.to_string(), station.to_string()), id.into());
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.overrides.is_empty()
    }
}

impl StationIdResolver for StationIdTable {
    fn resolve(&self, line: &str, station: &str) -> Option<String> {
        let key = (line.to_string(), station.to_string());
        self.overrides
            .get(&key)
            .or_else(|| self.ids.get(&key))
            .cloned()
    }
}
