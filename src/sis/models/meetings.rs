use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A faculty member attached to a class or meeting time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyItem {
    pub banner_id: String,            // e.g. "@01647907"
    pub course_reference_number: String,
    pub display_name: String,         // "LastName, FirstName"
    #[serde(default)]
    pub email_address: Option<String>,
    pub primary_indicator: bool,
}

/// One entry of the `meetingsFaculty` array on a search row, and of the
/// `fmt` array on the meeting-times endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingTimeResponse {
    pub category: Option<String>,
    pub course_reference_number: String,
    #[serde(default)]
    pub faculty: Vec<FacultyItem>,
    pub meeting_time: MeetingTime,
    pub term: String,
}

/// Raw meeting time block from the SIS.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingTime {
    pub begin_time: Option<String>, // HHMM, e.g. 1000
    pub end_time: Option<String>,   // HHMM, e.g. 1150
    pub start_date: String,         // MM/DD/YYYY
    pub end_date: String,           // MM/DD/YYYY
    pub category: Option<String>,
    pub credit_hour_session: Option<f64>,
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
    pub campus: Option<String>,
    pub campus_description: Option<String>,
    pub building: Option<String>,
    pub building_description: Option<String>,
    pub room: Option<String>,
}

/// Response wrapper of the meeting-times endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingTimesResponse {
    pub fmt: Vec<MeetingTimeResponse>,
}

/// Normalized meeting entry stored in term snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeetingRecord {
    pub begin_time: Option<String>,
    pub end_time: Option<String>,
    pub credit_hours: Option<f64>,
    pub campus: Option<String>,
    pub campus_description: Option<String>,
    pub building: Option<String>,
    pub building_description: Option<String>,
    pub category: Option<String>,
    pub room: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub days: Vec<String>,
}

impl MeetingRecord {
    /// Flattens a raw meeting time into the snapshot shape.
    pub fn from_meeting_time(meeting_time: &MeetingTime) -> Self {
        MeetingRecord {
            begin_time: meeting_time.begin_time.clone(),
            end_time: meeting_time.end_time.clone(),
            credit_hours: meeting_time.credit_hour_session,
            campus: meeting_time.campus.clone(),
            campus_description: meeting_time.campus_description.clone(),
            building: meeting_time.building.clone(),
            building_description: meeting_time.building_description.clone(),
            category: meeting_time.category.clone(),
            room: meeting_time.room.clone(),
            start_date: parse_mm_dd_yyyy(&meeting_time.start_date),
            end_date: parse_mm_dd_yyyy(&meeting_time.end_date),
            days: meeting_days(meeting_time),
        }
    }
}

/// Parses the MM/DD/YYYY date format the SIS uses for meeting ranges.
fn parse_mm_dd_yyyy(date_str: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%m/%d/%Y").ok()
}

/// Registrar day letters in week order; `R` is Thursday, `U` is Sunday.
fn meeting_days(meeting_time: &MeetingTime) -> Vec<String> {
    [
        (meeting_time.sunday, "U"),
        (meeting_time.monday, "M"),
        (meeting_time.tuesday, "T"),
        (meeting_time.wednesday, "W"),
        (meeting_time.thursday, "R"),
        (meeting_time.friday, "F"),
        (meeting_time.saturday, "S"),
    ]
    .iter()
    .filter(|(meets, _)| *meets)
    .map(|(_, letter)| letter.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_meeting_time() -> MeetingTime {
        MeetingTime {
            begin_time: Some("1000".to_string()),
            end_time: Some("1150".to_string()),
            start_date: "08/28/2023".to_string(),
            end_date: "12/13/2023".to_string(),
            category: Some("01".to_string()),
            credit_hour_session: Some(4.0),
            monday: true,
            tuesday: false,
            wednesday: false,
            thursday: true,
            friday: false,
            saturday: false,
            sunday: false,
            campus: Some("T".to_string()),
            campus_description: Some("Troy".to_string()),
            building: Some("DCC".to_string()),
            building_description: Some("Darrin Communications Center".to_string()),
            room: Some("308".to_string()),
        }
    }

    #[test]
    fn test_meeting_days_letters() {
        let record = MeetingRecord::from_meeting_time(&sample_meeting_time());
        assert_eq!(record.days, vec!["M", "R"]);
    }

    #[test]
    fn test_meeting_days_week_order_starts_sunday() {
        let mut meeting_time = sample_meeting_time();
        meeting_time.sunday = true;
        meeting_time.saturday = true;
        let record = MeetingRecord::from_meeting_time(&meeting_time);
        assert_eq!(record.days, vec!["U", "M", "R", "S"]);
    }

    #[test]
    fn test_meeting_dates_parsed() {
        let record = MeetingRecord::from_meeting_time(&sample_meeting_time());
        assert_eq!(record.start_date, NaiveDate::from_ymd_opt(2023, 8, 28));
        assert_eq!(record.end_date, NaiveDate::from_ymd_opt(2023, 12, 13));
    }

    #[test]
    fn test_meeting_unparseable_date_is_none() {
        let mut meeting_time = sample_meeting_time();
        meeting_time.start_date = "TBA".to_string();
        let record = MeetingRecord::from_meeting_time(&meeting_time);
        assert_eq!(record.start_date, None);
    }

    #[test]
    fn test_meeting_time_deserializes_from_wire_shape() {
        let body = r#"{
            "category": "01",
            "courseReferenceNumber": "42706",
            "faculty": [],
            "meetingTime": {
                "beginTime": "1000",
                "endTime": "1150",
                "startDate": "08/28/2023",
                "endDate": "12/13/2023",
                "category": "01",
                "creditHourSession": 4.0,
                "monday": true,
                "tuesday": false,
                "wednesday": false,
                "thursday": true,
                "friday": false,
                "saturday": false,
                "sunday": false,
                "campus": "T",
                "campusDescription": "Troy",
                "building": "DCC",
                "buildingDescription": "Darrin Communications Center",
                "room": "308"
            },
            "term": "202309"
        }"#;
        let response: MeetingTimeResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.course_reference_number, "42706");
        assert!(response.meeting_time.monday);
        assert_eq!(response.meeting_time.room.as_deref(), Some("308"));
    }
}
