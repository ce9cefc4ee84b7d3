//! Subject worker: one fresh session per subject.

use anyhow::Result;
use futures::future::try_join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::codemaps::CodeMaps;
use crate::harvest::SessionSettings;
use crate::harvest::class::process_class;
use crate::harvest::snapshot::CourseMap;
use crate::sis::SisClient;
use crate::sis::term::Term;

/// Harvests every section of one subject in one term.
///
/// A fresh session is opened per subject: the SIS binds search state to the
/// session, so sharing one across concurrently-running subjects would
/// interleave reset and search calls and return stale rows. Any failure is
/// converted to an empty course map so sibling subjects keep going.
pub async fn scrape_subject(
    term: Term,
    subject: String,
    settings: SessionSettings,
    maps: Arc<CodeMaps>,
    sessions: Arc<Semaphore>,
) -> CourseMap {
    let _permit = sessions
        .acquire_owned()
        .await
        .expect("session semaphore closed");

    match scrape_subject_inner(&term, &subject, &settings, &maps).await {
        Ok(courses) => courses,
        Err(error) => {
            warn!(%term, subject, error = ?error, "failed to scrape subject");
            CourseMap::new()
        }
    }
}

async fn scrape_subject_inner(
    term: &Term,
    subject: &str,
    settings: &SessionSettings,
    maps: &CodeMaps,
) -> Result<CourseMap> {
    let client = SisClient::new(&settings.base_url, settings.limit_per_host, settings.timeout)?;

    // Search state is per session: the reset must be the most recent
    // search-related call before the search itself.
    client.reset_class_search(term).await?;
    let entries = client.class_search(term, subject).await?;
    debug!(%term, subject, count = entries.len(), "retrieved class search rows");

    let records = try_join_all(
        entries
            .iter()
            .map(|entry| process_class(&client, term, entry, maps)),
    )
    .await?;

    let mut courses = CourseMap::new();
    for (entry, record) in entries.iter().zip(records) {
        courses
            .entry(entry.course_number.clone())
            .or_default()
            .push(record);
    }
    for sections in courses.values_mut() {
        sections.sort_by(|a, b| a.section_number.cmp(&b.section_number));
    }

    Ok(courses)
}
