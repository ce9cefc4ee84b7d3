//! Normalized snapshot types written to per-term JSON files.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::sis::models::{Corequisite, Crosslist, MeetingRecord};

/// Identifier recorded when an instructor has no institutional email; the
/// codifier later synthesizes a real identifier for these entries.
pub const UNKNOWN_IDENTIFIER: &str = "Unknown RCSID";

/// Seat or waitlist occupancy counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SeatCounts {
    pub capacity: i64,
    pub registered: i64,
    pub available: i64,
}

/// An instructor attached to one section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstructorRecord {
    pub identifier: String,
    pub display_name: String,
    pub email: Option<String>,
    pub primary: bool,
    pub banner_id: String,
}

/// One section of a course, fully detailed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassRecord {
    pub crn: String,
    pub section_number: String,
    pub title: String,
    pub description: String,
    pub attributes: Vec<String>,
    pub restrictions: BTreeMap<String, Vec<String>>,
    /// Always the empty object; prerequisite parsing is deferred.
    pub prerequisites: Value,
    pub corequisites: Vec<Corequisite>,
    pub crosslists: Vec<Crosslist>,
    pub credit_min: f64,
    pub credit_max: f64,
    pub seats: SeatCounts,
    pub waitlist: SeatCounts,
    pub faculty: Vec<InstructorRecord>,
    pub meetings: Vec<MeetingRecord>,
}

/// Sections grouped by course number; BTreeMap ordering keeps course numbers
/// ascending in the written file.
pub type CourseMap = BTreeMap<String, Vec<ClassRecord>>;

/// All courses harvested for one subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectSnapshot {
    pub subject_name: String,
    pub courses: CourseMap,
}

/// Snapshot of every subject in a term, keyed by subject code.
pub type TermSnapshot = BTreeMap<String, SubjectSnapshot>;
