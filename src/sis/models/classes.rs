use serde::{Deserialize, Serialize};

use super::meetings::{FacultyItem, MeetingTimeResponse};

/// One row of the paged class-search response.
///
/// Each row describes a single section; the course-level view is assembled by
/// the harvester. Only the fields the harvester consumes are modeled; the SIS
/// sends many more, which serde ignores.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSearchEntry {
    pub term: String,
    pub course_reference_number: String,
    pub subject: String,
    pub subject_description: String,
    pub course_number: String,
    pub sequence_number: String,
    pub course_title: String,
    pub credit_hour_low: Option<f64>,
    pub credit_hour_high: Option<f64>,
    pub maximum_enrollment: i64,
    pub enrollment: i64,
    pub seats_available: i64,
    #[serde(default)]
    pub wait_capacity: Option<i64>,
    #[serde(default)]
    pub wait_count: Option<i64>,
    #[serde(default)]
    pub wait_available: Option<i64>,
    #[serde(default)]
    pub faculty: Vec<FacultyItem>,
    #[serde(default)]
    pub meetings_faculty: Vec<MeetingTimeResponse>,
}

/// Wrapper shape of the class-search endpoint. `data` is null when the
/// session was not reset for the requested term or the subject is unknown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub data: Option<Vec<ClassSearchEntry>>,
}

/// A corequisite row from the class-detail corequisites table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Corequisite {
    pub subject_name: String,
    pub course_number: String,
    pub title: String,
}

/// A cross-listed section row from the class-detail crosslist table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Crosslist {
    pub crn: String,
    pub subject_name: String,
    pub course_number: String,
    pub title: String,
    pub section_number: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_null_data() {
        let response: SearchResponse = serde_json::from_str(r#"{"data": null}"#).unwrap();
        assert!(response.data.is_none());
    }

    #[test]
    fn test_search_entry_deserializes_from_wire_shape() {
        let body = r#"{
            "data": [{
                "term": "202309",
                "courseReferenceNumber": "42706",
                "subject": "CSCI",
                "subjectDescription": "Computer Science",
                "courseNumber": "1100",
                "sequenceNumber": "01",
                "courseTitle": "Computer Science I",
                "creditHourLow": 4.0,
                "creditHourHigh": null,
                "maximumEnrollment": 300,
                "enrollment": 271,
                "seatsAvailable": 29,
                "waitCapacity": 50,
                "waitCount": 0,
                "waitAvailable": 50,
                "faculty": [],
                "meetingsFaculty": [],
                "openSection": true
            }]
        }"#;
        let response: SearchResponse = serde_json::from_str(body).unwrap();
        let entries = response.data.unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.course_reference_number, "42706");
        assert_eq!(entry.sequence_number, "01");
        assert_eq!(entry.credit_hour_low, Some(4.0));
        assert_eq!(entry.credit_hour_high, None);
        assert_eq!(entry.maximum_enrollment, 300);
    }

    #[test]
    fn test_search_entry_missing_optional_arrays() {
        let body = r#"{
            "term": "202309",
            "courseReferenceNumber": "42706",
            "subject": "CSCI",
            "subjectDescription": "Computer Science",
            "courseNumber": "1100",
            "sequenceNumber": "01",
            "courseTitle": "Computer Science I",
            "creditHourLow": null,
            "creditHourHigh": null,
            "maximumEnrollment": 300,
            "enrollment": 271,
            "seatsAvailable": 29
        }"#;
        let entry: ClassSearchEntry = serde_json::from_str(body).unwrap();
        assert!(entry.faculty.is_empty());
        assert!(entry.meetings_faculty.is_empty());
        assert_eq!(entry.wait_capacity, None);
    }
}
