//! Shared JSON file helpers.
//!
//! Every file this crate persists uses the same conventions: UTF-8, 4-space
//! indentation, and non-ASCII text written verbatim rather than escaped.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::BufWriter;
use std::path::Path;

/// Serializes `value` to `path` as indented JSON, creating parent directories
/// as needed.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(BufWriter::new(file), formatter);
    value
        .serialize(&mut serializer)
        .with_context(|| format!("Failed to write JSON to {}", path.display()))?;

    Ok(())
}

/// Reads and deserializes a JSON file.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&body).with_context(|| format!("Failed to parse JSON in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_round_trip_preserves_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/map.json");

        let mut map = BTreeMap::new();
        map.insert("COMM".to_string(), "Communication Intensive".to_string());
        map.insert("HINQ".to_string(), "HASS Inquiry".to_string());

        write_json_file(&path, &map).unwrap();
        let loaded: BTreeMap<String, String> = read_json_file(&path).unwrap();
        assert_eq!(loaded, map);
    }

    #[test]
    fn test_four_space_indent_and_raw_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unicode.json");

        let mut map = BTreeMap::new();
        map.insert("name".to_string(), "Café Français".to_string());
        write_json_file(&path, &map).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("    \"name\""));
        assert!(raw.contains("Café Français"));
        assert!(!raw.contains("\\u"));
    }

    #[test]
    fn test_read_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result: Result<BTreeMap<String, String>> =
            read_json_file(&dir.path().join("absent.json"));
        assert!(result.is_err());
    }
}
