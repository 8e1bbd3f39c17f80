#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use review_reporter::assembler::VoteStrategy;
use review_reporter::config::Config;
use review_reporter::error::{Error, Result};
use review_reporter::gerrit::GerritClient;
use review_reporter::redmine::{Wiki, WikiPage};

pub const INPUT_PAGE_TITLE: &str = "Code Reviews";

/// The input page as kept on the team's Redmine, CRLF line endings included.
pub fn sample_input_page() -> String {
    "\n\
h1. Code Reviews\n\
\n\
some text\n\
\n\
table{border:1px bordercolor:darkblue}.\n\
|_{background:#ffa}.Wiki page|_{background:#ffa}.Sprint|_{background:#ffa}.From (YYYY-MM-DD)|_{background:#ffa}.Until (YYYY-MM-DD)|_{background:#ffa}.Should be updated (yes/no)|_{background:#ffa}.Review numbers (space separated list)|\n\
| [[US904 - As a Dev I want to do code review on OpenStack code]] | #9 | 2014-04-28 | 2014-05-18 | YeS | 89220 90476 |\n\
|[[US1004 - As a Dev I want to do code review on OpenStack code]]| #10 | 2014-05-19 | 2014-06-08 | nO | |\n\
| [[US1104 - As a Dev I want to do code review on OpenStack code]] | #11 | | | | |\n\
|||||||\n\
| [[  ]] ||||yes||\n\
\n\
more text\n"
        .replace('\n', "\r\n")
}

/// Sensible default `Config` for tests. Callers can override fields via struct update syntax.
pub fn default_test_config() -> Config {
    Config {
        gerrit_url: "https://review.example.org".to_string(),
        redmine_url: "https://redmine.example.org".to_string(),
        redmine_project: "reviews".to_string(),
        redmine_key: "secret".to_string(),
        input_page: INPUT_PAGE_TITLE.to_string(),
        reviewer_domain: "@lsd.ufcg.edu.br".to_string(),
        vote_strategy: VoteStrategy::Label,
        max_concurrent_fetches: 2,
        request_timeout: 5,
        dry_run: false,
        std_out: false,
        ignore_should_be_updated: false,
    }
}

/// Gerrit serving canned documents and counting requests.
#[derive(Default)]
pub struct FakeGerrit {
    changes: HashMap<String, Value>,
    revisions: HashMap<(String, String), Value>,
    requests: Mutex<Vec<String>>,
}

impl FakeGerrit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_change(mut self, number: &str, change: Value) -> Self {
        self.changes.insert(number.to_string(), change);
        self
    }

    pub fn with_revision(mut self, number: &str, revision_id: &str, revision: Value) -> Self {
        self.revisions
            .insert((number.to_string(), revision_id.to_string()), revision);
        self
    }

    /// Requests made so far, sorted (changes are fetched concurrently), and
    /// forget them.
    pub fn take_requests(&self) -> Vec<String> {
        let mut requests = std::mem::take(&mut *self.requests.lock().unwrap());
        requests.sort();
        requests
    }
}

impl GerritClient for FakeGerrit {
    fn fetch_change(&self, number: &str) -> Result<Value> {
        self.requests.lock().unwrap().push(format!("change {number}"));
        self.changes
            .get(number)
            .cloned()
            .ok_or_else(|| Error::FetchFailed(format!("change {number}: 404 Not Found")))
    }

    fn fetch_revision(&self, number: &str, revision_id: &str) -> Result<Value> {
        self.requests
            .lock()
            .unwrap()
            .push(format!("revision {number}/{revision_id}"));
        self.revisions
            .get(&(number.to_string(), revision_id.to_string()))
            .cloned()
            .ok_or_else(|| Error::FetchFailed(format!("revision {revision_id}: 404 Not Found")))
    }

    fn site(&self) -> &str {
        "https://review.openstack.org"
    }
}

/// Wiki whose pages and writes stay observable after it is handed off.
#[derive(Clone, Default)]
pub struct FakeWiki {
    pages: Arc<Mutex<HashMap<String, String>>>,
    rejected: Arc<Mutex<Vec<String>>>,
    pub writes: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeWiki {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, title: &str, text: &str) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(title.to_string(), text.to_string());
        self
    }

    /// Writes to `title` are refused (`create_or_update` returns false).
    pub fn rejecting(self, title: &str) -> Self {
        self.rejected.lock().unwrap().push(title.to_string());
        self
    }

    pub fn page(&self, title: &str) -> Option<String> {
        self.pages.lock().unwrap().get(title).cloned()
    }

    pub fn written_titles(&self) -> Vec<String> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .map(|(title, _)| title.clone())
            .collect()
    }
}

impl Wiki for FakeWiki {
    fn get_page(&self, title: &str) -> Result<WikiPage> {
        self.page(title)
            .map(|text| WikiPage {
                title: title.to_string(),
                text,
            })
            .ok_or_else(|| Error::WikiReadFailed(format!("page '{title}' not found")))
    }

    fn create_or_update(&self, title: &str, text: &str) -> Result<bool> {
        if self.rejected.lock().unwrap().iter().any(|t| t == title) {
            return Ok(false);
        }
        self.writes
            .lock()
            .unwrap()
            .push((title.to_string(), text.to_string()));
        self.pages
            .lock()
            .unwrap()
            .insert(title.to_string(), text.to_string());
        Ok(true)
    }
}

pub fn account(name: &str, email: &str) -> Value {
    json!({ "name": name, "email": email })
}

/// Change detail as returned by `GET /changes/{n}?o=ALL_REVISIONS&o=MESSAGES`.
pub fn change(
    number: u64,
    change_id: &str,
    subject: &str,
    revisions: &[(&str, u32)],
    messages: Vec<Value>,
) -> Value {
    let revisions: serde_json::Map<String, Value> = revisions
        .iter()
        .map(|(id, n)| (id.to_string(), json!({ "_number": n })))
        .collect();
    json!({
        "id": format!("openstack%2Fnova~master~{change_id}"),
        "project": "openstack/nova",
        "branch": "master",
        "change_id": change_id,
        "subject": subject,
        "status": "MERGED",
        "_number": number,
        "revisions": revisions,
        "messages": messages,
    })
}

pub fn message(author: Option<Value>, text: &str, date: &str, revision: u32) -> Value {
    let mut message = json!({
        "id": format!("msg-{revision}-{}", text.len()),
        "date": date,
        "message": text,
        "_revision_number": revision,
    });
    if let Some(author) = author {
        message["author"] = author;
    }
    message
}

/// Review detail as returned by `GET /changes/{n}/revisions/{id}/review`.
pub fn revision(id: &str, number: u32, votes: Option<Vec<Value>>) -> Value {
    let labels = match votes {
        Some(all) => json!({ "Code-Review": { "all": all } }),
        None => json!({}),
    };
    json!({
        "id": id,
        "revisions": { id: { "_number": number } },
        "labels": labels,
    })
}

pub fn vote(name: &str, email: &str, value: i8) -> Value {
    json!({ "name": name, "email": email, "value": value })
}
