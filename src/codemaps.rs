//! Cross-term code dictionaries accumulated while scraping.
//!
//! Four mappings are shared by every term task in a run: subject code →
//! name, attribute code → name, instructor identifier → name, and
//! restriction type → code → name. Writes are last-write-wins; a write that
//! changes an existing entry is logged so name drift between terms stays
//! visible. Each map sits behind its own mutex because the check-then-set of
//! an upsert is not atomic across worker threads.

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

use crate::util;

/// File-system locations of the four persisted dictionaries.
#[derive(Debug, Clone)]
pub struct CodeMapPaths {
    pub subjects: PathBuf,
    pub attributes: PathBuf,
    pub instructors: PathBuf,
    pub restrictions: PathBuf,
}

/// The shared dictionary accumulator.
#[derive(Debug, Default)]
pub struct CodeMaps {
    subjects: Mutex<BTreeMap<String, String>>,
    attributes: Mutex<BTreeMap<String, String>>,
    instructors: Mutex<BTreeMap<String, String>>,
    restrictions: Mutex<BTreeMap<String, BTreeMap<String, String>>>,
}

impl CodeMaps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads whichever dictionary files already exist at `paths`; missing
    /// files start their map empty.
    pub fn load(paths: &CodeMapPaths) -> Result<Self> {
        let maps = Self::new();

        if let Some(loaded) = load_existing::<BTreeMap<String, String>>(&paths.subjects, "subject")?
        {
            *maps.subjects.lock().unwrap() = loaded;
        }
        if let Some(loaded) =
            load_existing::<BTreeMap<String, String>>(&paths.attributes, "attribute")?
        {
            *maps.attributes.lock().unwrap() = loaded;
        }
        if let Some(loaded) =
            load_existing::<BTreeMap<String, String>>(&paths.instructors, "instructor")?
        {
            *maps.instructors.lock().unwrap() = loaded;
        }
        if let Some(loaded) = load_existing::<BTreeMap<String, BTreeMap<String, String>>>(
            &paths.restrictions,
            "restriction",
        )? {
            *maps.restrictions.lock().unwrap() = normalize_restrictions(loaded);
        }

        Ok(maps)
    }

    /// Writes all four dictionaries; BTreeMap ordering keeps keys sorted.
    pub fn save(&self, paths: &CodeMapPaths) -> Result<()> {
        let subjects = self.subjects.lock().unwrap();
        info!(
            count = subjects.len(),
            path = %paths.subjects.display(),
            "writing subject code mappings"
        );
        util::write_json_file(&paths.subjects, &*subjects)?;

        let attributes = self.attributes.lock().unwrap();
        info!(
            count = attributes.len(),
            path = %paths.attributes.display(),
            "writing attribute code mappings"
        );
        util::write_json_file(&paths.attributes, &*attributes)?;

        let instructors = self.instructors.lock().unwrap();
        info!(
            count = instructors.len(),
            path = %paths.instructors.display(),
            "writing instructor identifier mappings"
        );
        util::write_json_file(&paths.instructors, &*instructors)?;

        let restrictions = self.restrictions.lock().unwrap();
        info!(
            count = restrictions.values().map(BTreeMap::len).sum::<usize>(),
            path = %paths.restrictions.display(),
            "writing restriction code mappings"
        );
        util::write_json_file(&paths.restrictions, &*restrictions)?;

        Ok(())
    }

    pub fn upsert_subject(&self, code: &str, name: &str) {
        let mut map = self.subjects.lock().unwrap();
        if let Some(existing) = map.get(code)
            && existing != name
        {
            warn!(code, existing, new = name, "conflicting subject names");
        }
        map.insert(code.to_string(), name.to_string());
    }

    pub fn upsert_attribute(&self, code: &str, name: &str) {
        let mut map = self.attributes.lock().unwrap();
        if let Some(existing) = map.get(code)
            && existing != name
        {
            warn!(code, existing, new = name, "conflicting attribute names");
        }
        map.insert(code.to_string(), name.to_string());
    }

    pub fn upsert_instructor(&self, identifier: &str, name: &str) {
        let mut map = self.instructors.lock().unwrap();
        if let Some(existing) = map.get(identifier)
            && existing != name
        {
            warn!(identifier, existing, new = name, "conflicting instructor names");
        }
        map.insert(identifier.to_string(), name.to_string());
    }

    /// Upserts a restriction name under its base type; `not_` polarity
    /// prefixes are folded away.
    pub fn upsert_restriction(&self, restriction_type: &str, code: &str, name: &str) {
        let restriction_type = restriction_type
            .strip_prefix("not_")
            .unwrap_or(restriction_type);
        let mut map = self.restrictions.lock().unwrap();
        let entry = map.entry(restriction_type.to_string()).or_default();
        if let Some(existing) = entry.get(code)
            && existing != name
        {
            warn!(
                restriction_type,
                code, existing,
                new = name,
                "conflicting restriction names"
            );
        }
        entry.insert(code.to_string(), name.to_string());
    }

    /// Snapshot of the subject map.
    pub fn subjects(&self) -> BTreeMap<String, String> {
        self.subjects.lock().unwrap().clone()
    }

    /// Snapshot of the attribute map.
    pub fn attributes(&self) -> BTreeMap<String, String> {
        self.attributes.lock().unwrap().clone()
    }

    /// Snapshot of the instructor map.
    pub fn instructors(&self) -> BTreeMap<String, String> {
        self.instructors.lock().unwrap().clone()
    }

    /// Snapshot of the restriction map.
    pub fn restrictions(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        self.restrictions.lock().unwrap().clone()
    }
}

fn load_existing<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<Option<T>> {
    if !path.exists() {
        info!(path = %path.display(), "no existing {what} code mappings");
        return Ok(None);
    }
    let loaded: T = util::read_json_file(path)?;
    info!(path = %path.display(), "loaded existing {what} code mappings");
    Ok(Some(loaded))
}

/// Folds `not_`-prefixed type keys from older files into their base type.
fn normalize_restrictions(
    raw: BTreeMap<String, BTreeMap<String, String>>,
) -> BTreeMap<String, BTreeMap<String, String>> {
    let mut normalized: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    for (restriction_type, codes) in raw {
        let base = restriction_type
            .strip_prefix("not_")
            .unwrap_or(&restriction_type)
            .to_string();
        let entry = normalized.entry(base).or_default();
        for (code, name) in codes {
            entry.insert(code, name.trim().to_string());
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_paths(dir: &Path) -> CodeMapPaths {
        CodeMapPaths {
            subjects: dir.join("subject_code_name_map.json"),
            attributes: dir.join("attribute_code_name_map.json"),
            instructors: dir.join("instructor_rcsid_name_map.json"),
            restrictions: dir.join("restriction_code_name_map.json"),
        }
    }

    #[test]
    fn test_upsert_last_write_wins() {
        let maps = CodeMaps::new();
        maps.upsert_subject("CSCI", "Computer Science");
        maps.upsert_subject("CSCI", "Computer Sci.");
        assert_eq!(maps.subjects()["CSCI"], "Computer Sci.");
    }

    #[test]
    fn test_upsert_attribute_holds_for_observed_strings() {
        let maps = CodeMaps::new();
        maps.upsert_attribute("COMM", "Communication Intensive");
        assert_eq!(maps.attributes()["COMM"], "Communication Intensive");
    }

    #[test]
    fn test_upsert_restriction_strips_not_prefix() {
        let maps = CodeMaps::new();
        maps.upsert_restriction("not_level", "GR", "Graduate");
        maps.upsert_restriction("level", "UG", "Undergraduate");
        let restrictions = maps.restrictions();
        assert_eq!(restrictions["level"]["GR"], "Graduate");
        assert_eq!(restrictions["level"]["UG"], "Undergraduate");
        assert!(!restrictions.contains_key("not_level"));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let paths = temp_paths(dir.path());

        let maps = CodeMaps::new();
        maps.upsert_subject("CSCI", "Computer Science");
        maps.upsert_attribute("COMM", "Communication Intensive");
        maps.upsert_instructor("doej", "Doe, John");
        maps.upsert_restriction("level", "GR", "Graduate");
        maps.save(&paths).unwrap();

        let reloaded = CodeMaps::load(&paths).unwrap();
        assert_eq!(reloaded.subjects(), maps.subjects());
        assert_eq!(reloaded.attributes(), maps.attributes());
        assert_eq!(reloaded.instructors(), maps.instructors());
        assert_eq!(reloaded.restrictions(), maps.restrictions());
    }

    #[test]
    fn test_load_missing_files_start_empty() {
        let dir = tempfile::tempdir().unwrap();
        let maps = CodeMaps::load(&temp_paths(dir.path())).unwrap();
        assert!(maps.subjects().is_empty());
        assert!(maps.restrictions().is_empty());
    }

    #[test]
    fn test_load_normalizes_not_keys() {
        let dir = tempfile::tempdir().unwrap();
        let paths = temp_paths(dir.path());
        util::write_json_file(
            &paths.restrictions,
            &serde_json::json!({
                "level": {"GR": "Graduate"},
                "not_level": {"UG": " Undergraduate "},
            }),
        )
        .unwrap();

        let maps = CodeMaps::load(&paths).unwrap();
        let restrictions = maps.restrictions();
        assert_eq!(restrictions["level"]["GR"], "Graduate");
        assert_eq!(restrictions["level"]["UG"], "Undergraduate");
        assert!(!restrictions.contains_key("not_level"));
    }
}
