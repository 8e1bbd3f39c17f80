use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::gerrit::GerritClient;
use crate::redmine::{Wiki, WikiPage};

/// In-memory Gerrit serving canned documents. Unknown numbers fail like a 404.
pub struct MockGerrit {
    changes: HashMap<String, Value>,
    revisions: HashMap<(String, String), Value>,
}

impl MockGerrit {
    pub fn new() -> Self {
        Self {
            changes: HashMap::new(),
            revisions: HashMap::new(),
        }
    }

    /// Register a change document under its `_number`.
    pub fn with_change(mut self, change: Value) -> Self {
        let number = change["_number"].to_string();
        self.changes.insert(number, change);
        self
    }

    /// Register a revision document under its change number and `id`.
    pub fn with_revision(mut self, change_number: &str, revision: Value) -> Self {
        let id = revision["id"].as_str().unwrap_or_default().to_string();
        self.revisions
            .insert((change_number.to_string(), id), revision);
        self
    }
}

impl GerritClient for MockGerrit {
    fn fetch_change(&self, number: &str) -> Result<Value> {
        self.changes
            .get(number)
            .cloned()
            .ok_or_else(|| Error::FetchFailed(format!("change {number}: 404 Not Found")))
    }

    fn fetch_revision(&self, number: &str, revision_id: &str) -> Result<Value> {
        self.revisions
            .get(&(number.to_string(), revision_id.to_string()))
            .cloned()
            .ok_or_else(|| {
                Error::FetchFailed(format!("revision {revision_id} of {number}: 404 Not Found"))
            })
    }

    fn site(&self) -> &str {
        "https://review.example.org"
    }
}

/// In-memory wiki recording every write.
pub struct MockWiki {
    pages: HashMap<String, String>,
    failing_titles: Vec<String>,
    pub writes: Mutex<Vec<(String, String)>>,
}

impl MockWiki {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            failing_titles: Vec::new(),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn with_page(mut self, title: &str, text: &str) -> Self {
        self.pages.insert(title.to_string(), text.to_string());
        self
    }

    /// Writes to `title` report failure.
    pub fn failing_on(mut self, title: &str) -> Self {
        self.failing_titles.push(title.to_string());
        self
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

impl Wiki for MockWiki {
    fn get_page(&self, title: &str) -> Result<WikiPage> {
        self.pages
            .get(title)
            .map(|text| WikiPage {
                title: title.to_string(),
                text: text.clone(),
            })
            .ok_or_else(|| Error::WikiReadFailed(format!("page '{title}' not found")))
    }

    fn create_or_update(&self, title: &str, text: &str) -> Result<bool> {
        if self.failing_titles.iter().any(|t| t == title) {
            return Err(Error::WikiWriteFailed(format!("page '{title}': 422")));
        }
        self.writes
            .lock()
            .unwrap()
            .push((title.to_string(), text.to_string()));
        Ok(true)
    }
}

pub fn change_json(number: u64, revisions: &[(&str, u32)], messages: Vec<Value>) -> Value {
    let revisions: serde_json::Map<String, Value> = revisions
        .iter()
        .map(|(id, n)| (id.to_string(), json!({ "_number": n })))
        .collect();
    json!({
        "_number": number,
        "change_id": format!("I{number:0>12}abcdef0123456789"),
        "subject": format!("Subject of {number}"),
        "project": "openstack/nova",
        "revisions": revisions,
        "messages": messages,
    })
}

pub fn message_json(name: &str, email: &str, text: &str, date: &str, revision: u32) -> Value {
    json!({
        "author": { "name": name, "email": email },
        "message": text,
        "date": date,
        "_revision_number": revision,
    })
}

pub fn system_message_json(text: &str, revision: u32) -> Value {
    json!({
        "message": text,
        "date": "2014-05-01 00:00:00.000000000",
        "_revision_number": revision,
    })
}

pub fn revision_json(id: &str, number: u32, votes: Vec<Value>) -> Value {
    json!({
        "id": id,
        "revisions": { id: { "_number": number } },
        "labels": { "Code-Review": { "all": votes } },
    })
}

pub fn vote_json(username: Option<&str>, name: &str, email: Option<&str>, value: i8) -> Value {
    let mut vote = json!({ "name": name, "value": value });
    if let Some(username) = username {
        vote["username"] = json!(username);
    }
    if let Some(email) = email {
        vote["email"] = json!(email);
    }
    vote
}
