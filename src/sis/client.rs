//! Endpoint client for the SIS self-service API.
//!
//! The SIS binds class-search state to the HTTP session (cookie jar):
//! `reset_class_search` must be the most recent search-related call before
//! `class_search` within one session, otherwise the server keeps returning
//! rows from the last subject it served, or nothing at all for a different
//! term. Callers therefore bind one `SisClient` to one unit of sequenced
//! work and never share it across concurrent searches.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::sis::errors::SisApiError;
use crate::sis::fetch::fetch_text;
use crate::sis::models::{
    ClassSearchEntry, Corequisite, Crosslist, MeetingRecord, MeetingTimesResponse, Pair,
    SearchResponse,
};
use crate::sis::term::Term;
use crate::sis::{html, json, restrictions, unescape};

/// `max` parameter used to fetch entire listings in one page.
const LISTING_MAX: &str = "2147483647";

/// A session-scoped SIS client with its own cookie jar.
#[derive(Debug)]
pub struct SisClient {
    client: Client,
    base_url: String,
    permits: Semaphore,
}

impl SisClient {
    /// Creates a client limited to `limit_per_host` concurrent requests, each
    /// bounded by `timeout` in total.
    pub fn new(base_url: &str, limit_per_host: usize, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(user_agent())
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(SisClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            permits: Semaphore::new(limit_per_host),
        })
    }

    async fn fetch(&self, path: &str, params: &[(&str, String)]) -> Result<String, SisApiError> {
        let url = format!("{}{}", self.base_url, path);
        fetch_text(&self.client, &self.permits, &url, params).await
    }

    /// Fetches a detail tab for one section, returning the entity-unescaped
    /// HTML fragment.
    async fn fetch_detail(&self, path: &str, term: &Term, crn: &str) -> Result<String> {
        let params = [
            ("term", term.to_string()),
            ("courseReferenceNumber", crn.to_string()),
        ];
        let body = self.fetch(path, &params).await?;
        Ok(unescape::unescape_str(&body))
    }

    /// Decodes a JSON body: parse, recursively unescape entities, then map
    /// into the typed model.
    fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
        let value: Value = json::parse_json_with_context(body)?;
        json::from_value_with_path(unescape::unescape_value(value))
    }

    /// Lists the subjects offered in a term. An invalid or unknown term
    /// yields an empty list.
    pub async fn get_term_subjects(&self, term: &Term) -> Result<Vec<Pair>> {
        let params = [
            ("term", term.to_string()),
            ("offset", "1".to_string()),
            ("max", LISTING_MAX.to_string()),
        ];
        let body = self.fetch("/classSearch/get_subject", &params).await?;
        Self::decode(&body).context("Failed to parse subject listing")
    }

    /// Lists the instructors teaching in a term.
    pub async fn get_term_instructors(&self, term: &Term) -> Result<Vec<Pair>> {
        let params = [
            ("term", term.to_string()),
            ("offset", "1".to_string()),
            ("max", LISTING_MAX.to_string()),
        ];
        let body = self.fetch("/classSearch/get_instructor", &params).await?;
        Self::decode(&body).context("Failed to parse instructor listing")
    }

    /// Fetches the master list of attributes. Known to be incomplete: some
    /// attributes appearing on sections are missing from it.
    pub async fn get_all_attributes(&self, search: &str) -> Result<Vec<Pair>> {
        self.listing("/classSearch/get_attribute", search).await
    }

    /// Fetches the master list of colleges (schools). Not to be confused
    /// with campuses.
    pub async fn get_all_colleges(&self, search: &str) -> Result<Vec<Pair>> {
        self.listing("/classSearch/get_college", search).await
    }

    /// Fetches the master list of campuses.
    pub async fn get_all_campuses(&self, search: &str) -> Result<Vec<Pair>> {
        self.listing("/classSearch/get_campus", search).await
    }

    async fn listing(&self, path: &str, search: &str) -> Result<Vec<Pair>> {
        let params = [
            ("searchTerm", search.to_string()),
            ("offset", "1".to_string()),
            ("max", LISTING_MAX.to_string()),
        ];
        let body = self.fetch(path, &params).await?;
        Self::decode(&body).with_context(|| format!("Failed to parse listing from {path}"))
    }

    /// Resets the term and subject search state on the server.
    ///
    /// Must be called before each `class_search` within this session;
    /// otherwise the server keeps returning the previous subject's rows, or
    /// no data when the term changed.
    pub async fn reset_class_search(&self, term: &Term) -> Result<()> {
        let params = [("mode", "search".to_string()), ("term", term.to_string())];
        self.fetch("/term/search", &params).await?;
        Ok(())
    }

    /// Fetches every class of a subject in a term. The session must have been
    /// reset for this term immediately before.
    pub async fn class_search(&self, term: &Term, subject: &str) -> Result<Vec<ClassSearchEntry>> {
        let params = [
            ("txt_subject", subject.to_string()),
            ("txt_term", term.to_string()),
            ("pageOffset", "0".to_string()),
            ("pageMaxSize", LISTING_MAX.to_string()),
            ("sortColumn", "subjectDescription".to_string()),
            ("sortDirection", "asc".to_string()),
        ];
        let body = self.fetch("/searchResults/searchResults", &params).await?;
        let response: SearchResponse =
            Self::decode(&body).context("Failed to parse class search response")?;
        Ok(response.data.unwrap_or_default())
    }

    /// Fetches the course description of one section.
    pub async fn get_class_description(&self, term: &Term, crn: &str) -> Result<String> {
        let body = self
            .fetch_detail("/searchResults/getCourseDescription", term, crn)
            .await?;
        Ok(html::parse_description(&body, &term.code(), crn))
    }

    /// Fetches the attribute strings of one section, in wire form
    /// (`"<name>  <code>"`).
    pub async fn get_class_attributes(&self, term: &Term, crn: &str) -> Result<Vec<String>> {
        let body = self
            .fetch_detail("/searchResults/getSectionAttributes", term, crn)
            .await?;
        Ok(html::parse_attributes(&body))
    }

    /// Fetches the enrollment restrictions of one section, keyed by
    /// restriction type with `not_` variants for negative polarity.
    pub async fn get_class_restrictions(
        &self,
        term: &Term,
        crn: &str,
    ) -> Result<std::collections::BTreeMap<String, Vec<String>>> {
        let body = self
            .fetch_detail("/searchResults/getRestrictions", term, crn)
            .await?;
        Ok(restrictions::parse_restrictions(&body, &term.code(), crn))
    }

    /// Returns the prerequisites of one section.
    ///
    /// Prerequisite parsing is deferred; the result is always an empty
    /// structure and no request is issued.
    pub async fn get_class_prerequisites(&self, _term: &Term, _crn: &str) -> Result<Value> {
        Ok(Value::Object(serde_json::Map::new()))
    }

    /// Fetches the corequisite rows of one section.
    pub async fn get_class_corequisites(&self, term: &Term, crn: &str) -> Result<Vec<Corequisite>> {
        let body = self
            .fetch_detail("/searchResults/getCorequisites", term, crn)
            .await?;
        Ok(html::parse_corequisites(&body, &term.code(), crn))
    }

    /// Fetches the cross-listed section rows of one section.
    pub async fn get_class_crosslists(&self, term: &Term, crn: &str) -> Result<Vec<Crosslist>> {
        let body = self
            .fetch_detail("/searchResults/getXlstSections", term, crn)
            .await?;
        Ok(html::parse_crosslists(&body, &term.code(), crn))
    }

    /// Fetches the meeting times of one section from the dedicated endpoint.
    ///
    /// The scraping pipeline reads meetings off the search rows instead; this
    /// covers sections looked up individually.
    pub async fn get_class_meetings(&self, term: &Term, crn: &str) -> Result<Vec<MeetingRecord>> {
        let params = [
            ("term", term.to_string()),
            ("courseReferenceNumber", crn.to_string()),
        ];
        let body = self
            .fetch("/searchResults/getFacultyMeetingTimes", &params)
            .await?;
        let response: MeetingTimesResponse =
            Self::decode(&body).context("Failed to parse meeting times response")?;
        Ok(response
            .fmt
            .iter()
            .map(|entry| MeetingRecord::from_meeting_time(&entry.meeting_time))
            .collect())
    }
}

/// Browser-like user agent presented to the SIS.
fn user_agent() -> &'static str {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/113.0.0.0 Safari/537.36"
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_unescapes_entities() {
        let body = r#"[{"code": "STSS", "description": "Science, Technology, &amp; Society"}]"#;
        let pairs: Vec<Pair> = SisClient::decode(body).unwrap();
        assert_eq!(pairs[0].description, "Science, Technology, & Society");
    }

    #[test]
    fn test_decode_reports_path() {
        let body = r#"[{"code": 5, "description": "oops"}]"#;
        let result: Result<Vec<Pair>> = SisClient::decode(body);
        assert!(result.unwrap_err().to_string().contains("[0].code"));
    }

    #[tokio::test]
    async fn test_prerequisites_always_empty() {
        let client = SisClient::new("http://localhost:1", 5, Duration::from_secs(1)).unwrap();
        let term = Term::new(2023, "fall").unwrap();
        let prereqs = client.get_class_prerequisites(&term, "42706").await.unwrap();
        assert_eq!(prereqs, json!({}));
    }
}
