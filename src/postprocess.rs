//! Post-processing: rewrites harvested snapshots using the code dictionaries.
//!
//! Harvested snapshots carry human-readable names everywhere: attribute
//! strings, restriction items, subject names inside corequisite and crosslist
//! rows, and instructor display names. The codifier collapses those to their
//! short codes so downstream consumers join against the dictionaries instead
//! of duplicating names, and fills dictionary gaps it discovers along the
//! way. It operates on the raw JSON so re-running it over already-codified
//! files leaves them unchanged.

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{info, warn};

use crate::codemaps::CodeMapPaths;
use crate::config::Config;
use crate::harvest::snapshot::UNKNOWN_IDENTIFIER;
use crate::util;

/// Attribute wire form: name, two spaces, code. The greedy first group splits
/// at the last double-space, so names containing double spaces survive.
static ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+)  (.+)$").unwrap());

/// Restriction wire form: name followed by a parenthesized code.
static RESTRICTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+)\((.+)\)$").unwrap());

/// Legacy faculty string form: `"<Last>, <First> (<identifier>)"`.
static FACULTY_STRING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+) \((.+)\)$").unwrap());

/// Instructor display names: `"<Last>, <First>"`.
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+), (.+)$").unwrap());

/// Rewrites snapshots using the code dictionaries and keeps them up to date.
pub struct Codifier {
    attributes: BTreeMap<String, String>,
    instructors: BTreeMap<String, String>,
    restrictions: BTreeMap<String, BTreeMap<String, String>>,
    subjects: BTreeMap<String, String>,
    subject_name_to_code: BTreeMap<String, String>,
    instructor_name_to_id: BTreeMap<String, String>,
    /// Identifiers synthesized this run, kept separate for auditing.
    generated: BTreeMap<String, String>,
}

impl Codifier {
    /// Loads the dictionaries; missing files start their map empty.
    pub fn load(paths: &CodeMapPaths) -> Result<Self> {
        let attributes = load_map(&paths.attributes)?;
        let instructors = load_map(&paths.instructors)?;
        let restrictions = normalize_restrictions(load_nested_map(&paths.restrictions)?);
        let subjects = load_map(&paths.subjects)?;

        let subject_name_to_code = subjects
            .iter()
            .map(|(code, name)| (name.clone(), code.clone()))
            .collect();
        let instructor_name_to_id = instructors
            .iter()
            .map(|(identifier, name)| (name.clone(), identifier.clone()))
            .collect();

        Ok(Codifier {
            attributes,
            instructors,
            restrictions,
            subjects,
            subject_name_to_code,
            instructor_name_to_id,
            generated: BTreeMap::new(),
        })
    }

    /// Writes the four dictionaries plus the synthesized-identifier map.
    pub fn save(&self, paths: &CodeMapPaths, generated_path: &Path) -> Result<()> {
        util::write_json_file(&paths.attributes, &self.attributes)?;
        util::write_json_file(&paths.instructors, &self.instructors)?;
        util::write_json_file(&paths.restrictions, &self.restrictions)?;
        util::write_json_file(&paths.subjects, &self.subjects)?;
        util::write_json_file(generated_path, &self.generated)?;
        Ok(())
    }

    /// Codifies one term snapshot in place.
    pub fn codify_term(&mut self, term: &str, data: &mut Value) {
        let Some(subjects) = data.as_object_mut() else {
            warn!(term, "term file is not an object, skipping");
            return;
        };

        for (subject_code, subject_data) in subjects.iter_mut() {
            let subject_name = subject_data
                .get("subject_name")
                .and_then(Value::as_str)
                .map(str::to_string);
            if let Some(name) = subject_name {
                self.add_subject(subject_code, &name);
            }

            let Some(courses) = subject_data
                .get_mut("courses")
                .and_then(Value::as_object_mut)
            else {
                continue;
            };
            for sections in courses.values_mut() {
                let Some(sections) = sections.as_array_mut() else {
                    continue;
                };
                for section in sections {
                    self.codify_class(term, section);
                }
            }
        }
    }

    fn codify_class(&mut self, term: &str, section: &mut Value) {
        let crn = section
            .get("crn")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let Some(class) = section.as_object_mut() else {
            return;
        };

        if let Some(Value::Array(attributes)) = class.get_mut("attributes") {
            for attribute in attributes.iter_mut() {
                let Some(raw) = attribute.as_str().map(str::to_string) else {
                    continue;
                };
                *attribute = Value::String(self.codify_attribute(&raw, term, &crn));
            }
        }

        if let Some(Value::Object(restrictions)) = class.get_mut("restrictions") {
            restrictions.remove("special_approval");
            for (restriction_type, items) in restrictions.iter_mut() {
                let restriction_type = restriction_type.to_string();
                let Some(items) = items.as_array_mut() else {
                    continue;
                };
                for item in items.iter_mut() {
                    let Some(raw) = item.as_str().map(str::to_string) else {
                        continue;
                    };
                    *item = Value::String(self.codify_restriction(&restriction_type, &raw));
                }
            }
        }

        if let Some(Value::Array(faculty)) = class.get_mut("faculty") {
            for member in faculty.iter_mut() {
                let member_snapshot = member.clone();
                if let Some(identifier) = self.codify_faculty(&member_snapshot) {
                    *member = Value::String(identifier);
                }
            }
        }

        for field in ["corequisites", "crosslists"] {
            if let Some(Value::Array(items)) = class.get_mut(field) {
                for item in items.iter_mut() {
                    let Some(raw) = course_code_string(item) else {
                        continue;
                    };
                    *item = Value::String(self.codify_course_code(&raw));
                }
            }
        }
    }

    /// `"<name>  <code>"` → `"<code>"`, feeding the attribute dictionary.
    /// Strings without the double-space separator pass through unchanged.
    pub fn codify_attribute(&mut self, raw: &str, term: &str, crn: &str) -> String {
        match ATTRIBUTE_RE.captures(raw) {
            Some(caps) => {
                let name = caps[1].trim().to_string();
                let code = caps[2].trim().to_string();
                self.add_attribute(&code, &name);
                code
            }
            None => {
                warn!(term, crn, attribute = raw, "unexpected attribute format");
                raw.to_string()
            }
        }
    }

    /// `"<name> (<code>)"` → `"<code>"`, feeding the restriction dictionary.
    /// Free-text items pass through unchanged.
    pub fn codify_restriction(&mut self, restriction_type: &str, raw: &str) -> String {
        match RESTRICTION_RE.captures(raw) {
            Some(caps) => {
                let name = caps[1].trim().to_string();
                let code = caps[2].trim().to_string();
                self.add_restriction(restriction_type, &code, &name);
                code
            }
            None => raw.to_string(),
        }
    }

    /// `"<Full Subject Name> <number>"` → `"<code> <number>"` via the reverse
    /// subject map. Unknown subject names pass through and are logged, which
    /// also covers already-codified input.
    pub fn codify_course_code(&self, raw: &str) -> String {
        let Some((subject_name, course_number)) = raw.rsplit_once(' ') else {
            warn!(course = raw, "unexpected course code format");
            return raw.to_string();
        };
        match self.subject_name_to_code.get(subject_name.trim()) {
            Some(code) => format!("{code} {course_number}"),
            None => {
                warn!(course = raw, "unknown subject name in course code");
                raw.to_string()
            }
        }
    }

    /// Collapses a faculty entry (structured record or legacy display string)
    /// to a bare identifier, synthesizing one when the record carries none.
    /// Returns `None` when the entry should stay as-is.
    fn codify_faculty(&mut self, member: &Value) -> Option<String> {
        if let Some(record) = member.as_object() {
            let name = record
                .get("display_name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let identifier = record
                .get("identifier")
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN_IDENTIFIER)
                .to_string();

            let identifier = if identifier == UNKNOWN_IDENTIFIER {
                if name.is_empty() {
                    return None;
                }
                self.get_or_generate_id(&name)
            } else {
                identifier
            };
            if !name.is_empty() {
                self.add_instructor(&identifier, &name);
            }
            return Some(identifier);
        }

        if let Some(raw) = member.as_str() {
            let caps = FACULTY_STRING_RE.captures(raw)?;
            let name = caps[1].trim().to_string();
            let identifier = caps[2].trim().to_string();
            let identifier = if identifier == UNKNOWN_IDENTIFIER {
                self.get_or_generate_id(&name)
            } else {
                identifier
            };
            self.add_instructor(&identifier, &name);
            return Some(identifier);
        }

        None
    }

    /// Returns the identifier already recorded for `name`, or synthesizes a
    /// fresh one and records it in the generated dictionary.
    pub fn get_or_generate_id(&mut self, name: &str) -> String {
        if let Some(existing) = self.instructor_name_to_id.get(name) {
            return existing.clone();
        }
        let identifier = self.generate_id(name);
        self.generated.insert(identifier.clone(), name.to_string());
        identifier
    }

    /// Builds an identifier from `"<Last>, <First>"`: up to five alphabetic
    /// characters of the last name plus the first alphabetic character of the
    /// first name, lowercased, suffixed with the smallest integer ≥ 1 that
    /// keeps it unique among known instructors.
    fn generate_id(&self, name: &str) -> String {
        let Some(caps) = NAME_RE.captures(name) else {
            warn!(name, "unexpected instructor name format");
            let collapsed: String = name
                .chars()
                .filter(|c| !c.is_whitespace())
                .flat_map(char::to_lowercase)
                .collect();
            return collapsed.chars().take(8).collect();
        };

        let last: String = caps[1]
            .chars()
            .filter(|c| c.is_alphabetic())
            .take(5)
            .flat_map(char::to_lowercase)
            .collect();
        let first: String = caps[2]
            .chars()
            .filter(|c| c.is_alphabetic())
            .take(1)
            .flat_map(char::to_lowercase)
            .collect();

        let base = format!("{last}{first}");
        let mut candidate = base.clone();
        let mut counter = 1;
        while self.instructors.contains_key(&candidate) {
            candidate = format!("{base}{counter}");
            counter += 1;
        }
        candidate
    }

    fn add_subject(&mut self, code: &str, name: &str) {
        if let Some(existing) = self.subjects.get(code)
            && existing != name
        {
            warn!(code, existing, new = name, "conflicting subject names");
        }
        self.subjects.insert(code.to_string(), name.to_string());
        self.subject_name_to_code
            .insert(name.to_string(), code.to_string());
    }

    fn add_attribute(&mut self, code: &str, name: &str) {
        if let Some(existing) = self.attributes.get(code)
            && existing != name
        {
            warn!(code, existing, new = name, "conflicting attribute names");
        }
        self.attributes.insert(code.to_string(), name.to_string());
    }

    fn add_restriction(&mut self, restriction_type: &str, code: &str, name: &str) {
        let restriction_type = restriction_type
            .strip_prefix("not_")
            .unwrap_or(restriction_type);
        let entry = self
            .restrictions
            .entry(restriction_type.to_string())
            .or_default();
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
        entry.insert(code.to_string(), name.trim().to_string());
    }

    fn add_instructor(&mut self, identifier: &str, name: &str) {
        if let Some(existing) = self.instructors.get(identifier)
            && existing != name
        {
            warn!(identifier, existing, new = name, "conflicting instructor names");
        }
        self.instructors
            .insert(identifier.to_string(), name.to_string());
        self.instructor_name_to_id
            .insert(name.to_string(), identifier.to_string());
    }

    /// Dictionary entry counts, used for the closing summary.
    fn counts(&self) -> (usize, usize, usize, usize) {
        (
            self.attributes.len(),
            self.instructors.len(),
            self.restrictions.values().map(BTreeMap::len).sum(),
            self.subjects.len(),
        )
    }
}

/// Runs post-processing over every raw term file, writing codified copies to
/// the processed directory and saving the updated dictionaries.
pub fn run(config: &Config) -> Result<()> {
    let raw_dir = &config.scraper_raw_output_data_dir;
    anyhow::ensure!(
        raw_dir.exists(),
        "raw output directory {} does not exist",
        raw_dir.display()
    );

    let paths = config.code_map_paths();
    let mut codifier = Codifier::load(&paths)?;

    let mut term_files: Vec<_> = std::fs::read_dir(raw_dir)
        .with_context(|| format!("Failed to read {}", raw_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    term_files.sort();

    for path in term_files {
        let term = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
        let mut data: Value = util::read_json_file(&path)?;
        codifier.codify_term(&term, &mut data);

        let processed_path = config
            .scraper_processed_output_data_dir
            .join(format!("{term}.json"));
        info!(path = %processed_path.display(), "writing processed term data");
        util::write_json_file(&processed_path, &data)?;
    }

    let (attribute_count, instructor_count, restriction_count, subject_count) = codifier.counts();
    info!(
        attribute_count,
        instructor_count, restriction_count, subject_count, "saving code mappings"
    );
    codifier.save(&paths, &config.generated_instructor_map_path())?;

    Ok(())
}

fn load_map(path: &Path) -> Result<BTreeMap<String, String>> {
    if path.exists() && !path.is_dir() {
        return util::read_json_file(path);
    }
    Ok(BTreeMap::new())
}

fn load_nested_map(path: &Path) -> Result<BTreeMap<String, BTreeMap<String, String>>> {
    if path.exists() && !path.is_dir() {
        return util::read_json_file(path);
    }
    Ok(BTreeMap::new())
}

/// Folds `not_`-prefixed type keys into their base type.
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

/// Renders a corequisite/crosslist entry as `"<subject name> <number>"`.
/// String entries (already rendered or codified) pass through for another
/// look; anything else is left alone.
fn course_code_string(item: &Value) -> Option<String> {
    if let Some(raw) = item.as_str() {
        return Some(raw.to_string());
    }
    let record = item.as_object()?;
    let subject_name = record.get("subject_name").and_then(Value::as_str)?;
    let course_number = record.get("course_number").and_then(Value::as_str)?;
    Some(format!("{subject_name} {course_number}"))
}
