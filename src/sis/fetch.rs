//! HTTP plumbing shared by the endpoint client.

use rand::Rng;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::sis::errors::SisApiError;

/// Delivery attempts before a transient failure is surfaced.
const MAX_ATTEMPTS: usize = 3;

/// Base of the exponential backoff between attempts, in seconds.
const BACKOFF_BASE_SECS: f64 = 1.5;

/// Upper bound of the uniform jitter added to each backoff, in seconds.
const JITTER_MAX_SECS: f64 = 2.0;

/// Issues a GET and returns the body as text.
///
/// Transient failures (timeouts, connection errors, 5xx responses) are
/// retried with exponential backoff plus jitter; 4xx responses fail
/// immediately. `permits` caps in-flight requests within one session.
pub(crate) async fn fetch_text(
    client: &Client,
    permits: &Semaphore,
    url: &str,
    params: &[(&str, String)],
) -> Result<String, SisApiError> {
    let _permit = permits.acquire().await.expect("connection semaphore closed");

    let mut last_error: Option<reqwest::Error> = None;
    for attempt in 1..=MAX_ATTEMPTS {
        if attempt > 1 {
            tokio::time::sleep(backoff_delay(attempt)).await;
        }

        match client.get(url).query(params).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_client_error() {
                    return Err(SisApiError::ClientError {
                        url: url.to_string(),
                        status,
                    });
                }
                match response.error_for_status() {
                    Ok(response) => match response.text().await {
                        Ok(body) => return Ok(body),
                        Err(error) => {
                            debug!(url, attempt, %error, "failed to read response body");
                            last_error = Some(error);
                        }
                    },
                    Err(error) => {
                        debug!(url, attempt, %status, "server error, retrying");
                        last_error = Some(error);
                    }
                }
            }
            Err(error) if is_transient(&error) => {
                debug!(url, attempt, %error, "transient request failure");
                last_error = Some(error);
            }
            Err(error) => {
                return Err(SisApiError::Other(
                    anyhow::Error::new(error).context(format!("Request to {url} failed")),
                ));
            }
        }
    }

    Err(SisApiError::RetriesExhausted {
        url: url.to_string(),
        attempts: MAX_ATTEMPTS,
        source: last_error.expect("at least one attempt recorded an error"),
    })
}

/// Delay before `attempt` (1-based; the first retry is attempt 2).
fn backoff_delay(attempt: usize) -> Duration {
    let exponential = BACKOFF_BASE_SECS.powi(attempt as i32 - 1);
    let jitter = rand::rng().random_range(0.0..=JITTER_MAX_SECS);
    Duration::from_secs_f64(exponential + jitter)
}

fn is_transient(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}
