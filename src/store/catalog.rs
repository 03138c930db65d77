//! Catalog record and its JSON (de)serialization (§3 "File entry"/"Catalog",
//! §6 "Metadata file layout").
//!
//! New module — the teacher has no persistent state of its own. The wrapper
//! keys (`currentId`/`data` by default) are themselves configurable per
//! settings, so the catalog is built through a hand-assembled
//! `serde_json::Map` rather than a fixed `#[derive(Serialize)]` struct;
//! `FileEntry`'s own field names are fixed by §6 and so do derive normally.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One catalog record (§3 "File entry").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct FileEntry {
    #[serde(rename = "fileId")]
    pub(crate) file_id: u64,
    #[serde(rename = "fileName")]
    pub(crate) file_name: String,
    #[serde(rename = "fileType")]
    pub(crate) file_type: String,
    #[serde(rename = "fileSize")]
    pub(crate) file_size: String,
    #[serde(rename = "timeCreated")]
    pub(crate) time_created: String,
    #[serde(rename = "timeUpdated")]
    pub(crate) time_updated: String,
}

/// Timestamp format mandated by §3: `dd.MM.yyyy HH:mm`.
pub(crate) fn now_stamp() -> String {
    Local::now().format("%d.%m.%Y %H:%M").to_string()
}

/// Uppercase extension tag surrounded by `<>`, `<NULL>` when absent (§3).
pub(crate) fn type_tag(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!("<{}>", ext.to_uppercase()),
        _ => "<NULL>".to_string(),
    }
}

/// `"<kb> kb (<bytes> bytes)"` (§3).
pub(crate) fn size_tag(bytes: usize) -> String {
    format!("{} kb ({} bytes)", bytes / 1024, bytes)
}

/// In-memory catalog: monotone id counter plus id→entry map (§3 "Catalog").
#[derive(Debug, Default)]
pub(crate) struct Catalog {
    pub(crate) current_id: u64,
    pub(crate) entries: BTreeMap<u64, FileEntry>,
}

impl Catalog {
    /// Serializes to the §6 metadata-file shape, using the configured
    /// wrapper-key names.
    pub(crate) fn to_json(&self, id_key: &str, data_key: &str) -> serde_json::Value {
        let mut data = serde_json::Map::new();
        for (id, entry) in &self.entries {
            data.insert(id.to_string(), serde_json::to_value(entry).expect("FileEntry is always representable as JSON"));
        }

        let mut root = serde_json::Map::new();
        root.insert(id_key.to_string(), serde_json::Value::from(self.current_id));
        root.insert(data_key.to_string(), serde_json::Value::Object(data));
        serde_json::Value::Object(root)
    }

    /// Parses the §6 metadata-file shape back into a catalog.
    pub(crate) fn from_json(value: &serde_json::Value, id_key: &str, data_key: &str) -> Option<Self> {
        let root = value.as_object()?;
        let current_id = root.get(id_key)?.as_u64()?;
        let data = root.get(data_key)?.as_object()?;

        let mut entries = BTreeMap::new();
        for (key, raw) in data {
            let id: u64 = key.parse().ok()?;
            let entry: FileEntry = serde_json::from_value(raw.clone()).ok()?;
            entries.insert(id, entry);
        }

        Some(Self { current_id, entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tag_variants() {
        assert_eq!(type_tag("a.txt"), "<TXT>");
        assert_eq!(type_tag("archive.tar.gz"), "<GZ>");
        assert_eq!(type_tag("noext"), "<NULL>");
    }

    #[test]
    fn size_tag_format() {
        assert_eq!(size_tag(3), "0 kb (3 bytes)");
        assert_eq!(size_tag(2048), "2 kb (2048 bytes)");
    }

    #[test]
    fn round_trips_through_json() {
        let mut catalog = Catalog::default();
        catalog.current_id = 1;
        catalog.entries.insert(
            1,
            FileEntry {
                file_id: 1,
                file_name: "a.txt".to_string(),
                file_type: "<TXT>".to_string(),
                file_size: "0 kb (5 bytes)".to_string(),
                time_created: "01.01.2026 00:00".to_string(),
                time_updated: "01.01.2026 00:00".to_string(),
            },
        );

        let json = catalog.to_json("currentId", "data");
        let reloaded = Catalog::from_json(&json, "currentId", "data").unwrap();
        assert_eq!(reloaded.current_id, 1);
        assert_eq!(reloaded.entries.get(&1).unwrap().file_name, "a.txt");
    }
}
