//! Run driver: every valid term in the requested range, in parallel.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::info;

use crate::codemaps::CodeMaps;
use crate::config::Config;
use crate::harvest::SessionSettings;
use crate::harvest::term::scrape_term;
use crate::sis::term::{Season, Term};

/// Scrapes every `(year, season)` term in the inclusive year range into
/// `<raw dir>/<term>.json`, accumulating the shared dictionaries.
///
/// Returns the number of terms that produced data.
pub async fn run(
    config: &Config,
    start_year: u16,
    end_year: u16,
    maps: Arc<CodeMaps>,
) -> Result<usize> {
    let started = Instant::now();

    let sessions = Arc::new(Semaphore::new(config.max_sessions));
    let settings = SessionSettings {
        base_url: config.sis_base_url.clone(),
        limit_per_host: config.limit_per_host,
        timeout: config.request_timeout,
    };

    info!(
        start_year,
        end_year,
        max_sessions = config.max_sessions,
        limit_per_host = config.limit_per_host,
        "starting SIS scrape"
    );

    let mut tasks: JoinSet<bool> = JoinSet::new();
    for year in start_year..=end_year {
        for season in Season::ALL {
            let Some(term) = Term::from_parts(year, season) else {
                continue;
            };
            let output_path = config
                .scraper_raw_output_data_dir
                .join(format!("{term}.json"));
            tasks.spawn(scrape_term(
                term,
                output_path,
                settings.clone(),
                Arc::clone(&maps),
                Arc::clone(&sessions),
            ));
        }
    }

    let mut terms_processed = 0usize;
    while let Some(joined) = tasks.join_next().await {
        if joined.context("term task panicked")? {
            terms_processed += 1;
        }
    }

    info!(
        terms_processed,
        elapsed_seconds = format!("{:.2}", started.elapsed().as_secs_f64()),
        "SIS scrape complete"
    );

    Ok(terms_processed)
}
