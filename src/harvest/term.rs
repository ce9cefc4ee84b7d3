//! Term driver: fans subject workers out and writes the term snapshot.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::codemaps::CodeMaps;
use crate::harvest::SessionSettings;
use crate::harvest::snapshot::{CourseMap, SubjectSnapshot, TermSnapshot};
use crate::harvest::subject::scrape_subject;
use crate::sis::SisClient;
use crate::sis::term::Term;
use crate::util;

/// Harvests one term into `output_path`.
///
/// Returns true when at least one subject yielded courses. All failures are
/// logged and converted to false so sibling terms keep going.
pub async fn scrape_term(
    term: Term,
    output_path: PathBuf,
    settings: SessionSettings,
    maps: Arc<CodeMaps>,
    sessions: Arc<Semaphore>,
) -> bool {
    match scrape_term_inner(&term, &output_path, &settings, &maps, &sessions).await {
        Ok(found_courses) => found_courses,
        Err(error) => {
            error!(%term, error = ?error, "failed to process term");
            false
        }
    }
}

async fn scrape_term_inner(
    term: &Term,
    output_path: &Path,
    settings: &SessionSettings,
    maps: &Arc<CodeMaps>,
    sessions: &Arc<Semaphore>,
) -> Result<bool> {
    // Transient session just for the subject listing.
    let subjects = {
        let client =
            SisClient::new(&settings.base_url, settings.limit_per_host, settings.timeout)?;
        client.get_term_subjects(term).await?
    };

    if subjects.is_empty() {
        debug!(%term, "no subjects listed, skipping term");
        return Ok(false);
    }

    for subject in &subjects {
        maps.upsert_subject(&subject.code, &subject.description);
    }
    info!(%term, count = subjects.len(), "processing subjects");

    let mut snapshot = TermSnapshot::new();
    let mut tasks: JoinSet<(String, CourseMap)> = JoinSet::new();
    for subject in subjects {
        snapshot.insert(
            subject.code.clone(),
            SubjectSnapshot {
                subject_name: subject.description.clone(),
                courses: CourseMap::new(),
            },
        );

        let term = *term;
        let settings = settings.clone();
        let maps = Arc::clone(maps);
        let sessions = Arc::clone(sessions);
        tasks.spawn(async move {
            let courses =
                scrape_subject(term, subject.code.clone(), settings, maps, sessions).await;
            (subject.code, courses)
        });
    }

    let mut found_courses = false;
    while let Some(joined) = tasks.join_next().await {
        let (code, courses) = joined.context("subject task panicked")?;
        found_courses |= !courses.is_empty();
        if let Some(entry) = snapshot.get_mut(&code) {
            entry.courses = courses;
        }
    }

    info!(%term, path = %output_path.display(), "writing term snapshot");
    util::write_json_file(output_path, &snapshot)?;

    Ok(found_courses)
}
