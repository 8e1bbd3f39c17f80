pub mod payload;

use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{Error, Result};

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

/// Gerrit prepends this to every JSON response to defeat XSSI.
const XSSI_PREFIX: &str = ")]}'";

/// Fetch capability for the two Gerrit documents a report needs.
///
/// Implementations return the parsed JSON as-is; interpreting it is the
/// assembler's job.
pub trait GerritClient: Send + Sync {
    /// Change detail including every revision and every message.
    fn fetch_change(&self, number: &str) -> Result<serde_json::Value>;

    /// Review detail (labels and votes) for one revision of a change.
    fn fetch_revision(&self, number: &str, revision_id: &str) -> Result<serde_json::Value>;

    /// Base URL used to build change permalinks.
    fn site(&self) -> &str;
}

/// Gerrit REST client over HTTP.
pub struct HttpGerritClient {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpGerritClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    fn change_url(&self, number: &str) -> String {
        format!(
            "{}/changes/{number}?o=ALL_REVISIONS&o=MESSAGES",
            self.base_url
        )
    }

    fn revision_url(&self, number: &str, revision_id: &str) -> String {
        format!(
            "{}/changes/{number}/revisions/{revision_id}/review",
            self.base_url
        )
    }

    fn get_json(&self, url: &str) -> Result<serde_json::Value> {
        info!(url, "[gerrit] fetching");

        let mut backoff_ms = INITIAL_BACKOFF_MS;
        for attempt in 1..=MAX_RETRIES {
            match self.agent.get(url).set("Accept", "application/json").call() {
                Ok(response) => {
                    let body = response.into_string().map_err(|e| {
                        Error::FetchFailed(format!("failed to read response from {url}: {e}"))
                    })?;
                    return parse_body(&body).map_err(|e| {
                        Error::FetchFailed(format!("invalid JSON from {url}: {e}"))
                    });
                }
                Err(ref e) if attempt < MAX_RETRIES && is_retryable(e) => {
                    warn!(
                        attempt,
                        error = %e,
                        backoff_ms,
                        "retrying Gerrit request after transient error"
                    );
                    thread::sleep(Duration::from_millis(backoff_ms));
                    backoff_ms *= 2;
                }
                Err(e) => {
                    return Err(Error::FetchFailed(format!("GET {url} failed: {e}")));
                }
            }
        }
        unreachable!()
    }
}

impl GerritClient for HttpGerritClient {
    fn fetch_change(&self, number: &str) -> Result<serde_json::Value> {
        self.get_json(&self.change_url(number))
    }

    fn fetch_revision(&self, number: &str, revision_id: &str) -> Result<serde_json::Value> {
        self.get_json(&self.revision_url(number, revision_id))
    }

    fn site(&self) -> &str {
        &self.base_url
    }
}

/// Only retry rate-limits (429), server errors (5xx), and transport/network errors.
fn is_retryable(err: &ureq::Error) -> bool {
    match err {
        ureq::Error::Status(code, _) => *code == 429 || *code >= 500,
        ureq::Error::Transport(_) => true,
    }
}

fn parse_body(body: &str) -> serde_json::Result<serde_json::Value> {
    serde_json::from_str(strip_xssi_prefix(body))
}

fn strip_xssi_prefix(body: &str) -> &str {
    let trimmed = body.trim_start();
    trimmed.strip_prefix(XSSI_PREFIX).unwrap_or(trimmed)
}
