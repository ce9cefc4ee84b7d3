//! Error types for the SIS client.

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum SisApiError {
    /// A transient failure that survived every retry attempt.
    #[error("request to {url} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        url: String,
        attempts: usize,
        source: reqwest::Error,
    },
    /// A non-transient HTTP error; retrying would not help.
    #[error("request to {url} returned {status}")]
    ClientError { url: String, status: StatusCode },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
