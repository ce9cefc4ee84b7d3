//! Class-detail aggregation: six endpoint calls fanned out per section.

use anyhow::Result;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::warn;

use crate::codemaps::CodeMaps;
use crate::harvest::snapshot::{ClassRecord, InstructorRecord, SeatCounts, UNKNOWN_IDENTIFIER};
use crate::sis::SisClient;
use crate::sis::models::{ClassSearchEntry, FacultyItem, MeetingRecord};
use crate::sis::term::Term;

/// Email domain identifying institutional accounts; the local part of such an
/// address doubles as the instructor's identifier.
const INSTITUTIONAL_EMAIL_SUFFIX: &str = "@rpi.edu";

/// Restriction items carry their code as `"<name> (<code>)"`. Free-text items
/// (special approvals) have no code and fall through this pattern on purpose.
static RESTRICTION_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)\((.*)\)$").unwrap());

/// Fetches every detail tab for one search row and assembles the snapshot
/// record, feeding the attribute, restriction, and instructor dictionaries
/// along the way.
///
/// The six detail calls run simultaneously over the caller's session; the
/// first failure cancels the rest and propagates, aborting the record.
pub async fn process_class(
    client: &SisClient,
    term: &Term,
    entry: &ClassSearchEntry,
    maps: &CodeMaps,
) -> Result<ClassRecord> {
    let crn = &entry.course_reference_number;

    let (description, attributes, restrictions, prerequisites, corequisites, crosslists) = tokio::try_join!(
        client.get_class_description(term, crn),
        client.get_class_attributes(term, crn),
        client.get_class_restrictions(term, crn),
        client.get_class_prerequisites(term, crn),
        client.get_class_corequisites(term, crn),
        client.get_class_crosslists(term, crn),
    )?;

    record_attribute_codes(&attributes, maps, term, crn);
    record_restriction_codes(&restrictions, maps);

    let faculty = entry
        .faculty
        .iter()
        .map(|item| instructor_record(item, maps, term, crn))
        .collect();
    let meetings = entry
        .meetings_faculty
        .iter()
        .map(|meeting| MeetingRecord::from_meeting_time(&meeting.meeting_time))
        .collect();

    Ok(ClassRecord {
        crn: crn.clone(),
        section_number: entry.sequence_number.clone(),
        title: entry.course_title.clone(),
        description,
        attributes,
        restrictions,
        prerequisites,
        corequisites,
        crosslists,
        credit_min: entry.credit_hour_low.unwrap_or(0.0),
        credit_max: entry.credit_hour_high.unwrap_or(0.0),
        seats: SeatCounts {
            capacity: entry.maximum_enrollment,
            registered: entry.enrollment,
            available: entry.seats_available,
        },
        waitlist: SeatCounts {
            capacity: entry.wait_capacity.unwrap_or(0),
            registered: entry.wait_count.unwrap_or(0),
            available: entry.wait_available.unwrap_or(0),
        },
        faculty,
        meetings,
    })
}

/// Attribute wire form is `"<name>  <code>"` with the code as the final
/// whitespace-separated token. Strings with fewer than two tokens are logged
/// and skipped.
fn record_attribute_codes(attributes: &[String], maps: &CodeMaps, term: &Term, crn: &str) {
    for attribute in attributes {
        let tokens: Vec<&str> = attribute.split_whitespace().collect();
        if tokens.len() < 2 {
            warn!(%term, crn, attribute, "unexpected attribute format");
            continue;
        }
        let code = tokens[tokens.len() - 1];
        let name = tokens[..tokens.len() - 1].join(" ");
        maps.upsert_attribute(code, &name);
    }
}

/// Feeds parsed restriction items into the dictionary under their base type.
fn record_restriction_codes(restrictions: &BTreeMap<String, Vec<String>>, maps: &CodeMaps) {
    for (restriction_type, items) in restrictions {
        for item in items {
            let Some(caps) = RESTRICTION_ITEM_RE.captures(item) else {
                continue;
            };
            maps.upsert_restriction(restriction_type, caps[2].trim(), caps[1].trim());
        }
    }
}

/// Builds the snapshot instructor record, deriving the identifier from an
/// institutional email when one is present.
fn instructor_record(
    item: &FacultyItem,
    maps: &CodeMaps,
    term: &Term,
    crn: &str,
) -> InstructorRecord {
    let mut identifier = UNKNOWN_IDENTIFIER.to_string();
    match &item.email_address {
        Some(email) if email.ends_with(INSTITUTIONAL_EMAIL_SUFFIX) => {
            if let Some((local_part, _)) = email.split_once('@') {
                identifier = local_part.to_ascii_lowercase();
                maps.upsert_instructor(&identifier, &item.display_name);
            }
        }
        Some(_) => {}
        None => {
            warn!(
                %term,
                crn,
                instructor = item.display_name,
                "missing instructor email address"
            );
        }
    }

    InstructorRecord {
        identifier,
        display_name: item.display_name.clone(),
        email: item.email_address.clone(),
        primary: item.primary_indicator,
        banner_id: item.banner_id.clone(),
    }
}
