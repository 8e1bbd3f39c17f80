use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiPage {
    pub title: String,
    pub text: String,
}

/// Read/write access to the wiki of one tracker project.
pub trait Wiki {
    fn get_page(&self, title: &str) -> Result<WikiPage>;

    /// Create the page or replace its text. Returns whether the tracker
    /// accepted the write.
    fn create_or_update(&self, title: &str, text: &str) -> Result<bool>;
}

#[derive(Debug, Deserialize)]
struct WikiPageEnvelope {
    wiki_page: WikiPageBody,
}

#[derive(Debug, Deserialize)]
struct WikiPageBody {
    title: String,
    #[serde(default)]
    text: String,
}

/// Redmine REST wiki client.
pub struct RedmineWiki {
    base_url: String,
    project: String,
    api_key: String,
    agent: ureq::Agent,
}

impl RedmineWiki {
    pub fn new(base_url: &str, project: &str, api_key: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            project: project.to_string(),
            api_key: api_key.to_string(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    fn page_url(&self, title: &str) -> String {
        format!(
            "{}/projects/{}/wiki/{}.json",
            self.base_url,
            encode_path_segment(&self.project),
            encode_path_segment(&wiki_title(title))
        )
    }
}

impl Wiki for RedmineWiki {
    fn get_page(&self, title: &str) -> Result<WikiPage> {
        let url = self.page_url(title);
        info!(page = title, "[redmine] fetching wiki page");

        let response = self
            .agent
            .get(&url)
            .set("X-Redmine-API-Key", &self.api_key)
            .call()
            .map_err(|e| Error::WikiReadFailed(format!("GET {url} failed: {e}")))?;

        let envelope: WikiPageEnvelope = response
            .into_json()
            .map_err(|e| Error::WikiReadFailed(format!("invalid wiki page JSON from {url}: {e}")))?;

        Ok(WikiPage {
            title: envelope.wiki_page.title,
            text: envelope.wiki_page.text,
        })
    }

    fn create_or_update(&self, title: &str, text: &str) -> Result<bool> {
        let url = self.page_url(title);
        debug!(page = title, bytes = text.len(), "[redmine] writing wiki page");

        let body = serde_json::json!({ "wiki_page": { "text": text } });
        match self
            .agent
            .put(&url)
            .set("X-Redmine-API-Key", &self.api_key)
            .send_json(body)
        {
            // 201 when the page was created, 204 when it was updated.
            Ok(response) => Ok(matches!(response.status(), 200 | 201 | 204)),
            Err(ureq::Error::Status(code, response)) => {
                let detail = response.into_string().unwrap_or_default();
                Err(Error::WikiWriteFailed(format!(
                    "PUT {url} returned {code}: {}",
                    detail.trim()
                )))
            }
            Err(e) => Err(Error::WikiWriteFailed(format!("PUT {url} failed: {e}"))),
        }
    }
}

/// Redmine stores wiki titles with spaces replaced by underscores.
fn wiki_title(title: &str) -> String {
    title.trim().replace(' ', "_")
}

/// Everything outside the RFC 3986 unreserved set.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn encode_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wiki() -> RedmineWiki {
        RedmineWiki::new(
            "https://redmine.example.org/",
            "openstack-reviews",
            "secret",
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_page_url_replaces_spaces() {
        assert_eq!(
            wiki().page_url("Code Reviews"),
            "https://redmine.example.org/projects/openstack-reviews/wiki/Code_Reviews.json"
        );
    }

    #[test]
    fn test_page_url_encodes_reserved_characters() {
        assert_eq!(
            wiki().page_url("US904 - As a Dev I want to do code review on OpenStack code"),
            "https://redmine.example.org/projects/openstack-reviews/wiki/\
             US904_-_As_a_Dev_I_want_to_do_code_review_on_OpenStack_code.json"
        );
        assert_eq!(
            wiki().page_url("Sprint #9 / review?"),
            "https://redmine.example.org/projects/openstack-reviews/wiki/Sprint_%239_%2F_review%3F.json"
        );
    }

    #[test]
    fn test_encode_path_segment_utf8() {
        assert_eq!(encode_path_segment("Revisão"), "Revis%C3%A3o");
    }

    #[test]
    fn test_wiki_page_envelope_without_text() {
        let envelope: WikiPageEnvelope =
            serde_json::from_str(r#"{"wiki_page": {"title": "Empty", "version": 1}}"#).unwrap();
        assert_eq!(envelope.wiki_page.title, "Empty");
        assert_eq!(envelope.wiki_page.text, "");
    }
}
