use chrono::{DateTime, Utc};

use crate::extract::format_vote;

/// Number of change-id characters shown in a change title.
const SHORT_ID_LEN: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub username: Option<String>,
    pub name: String,
    pub email: Option<String>,
}

impl Author {
    /// First whitespace-delimited token of the full name.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or_default()
    }

    pub fn has_email_domain(&self, domain: &str) -> bool {
        self.email
            .as_deref()
            .is_some_and(|email| email.ends_with(domain))
    }
}

/// One reviewer's vote and comment on a revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub vote: i8,
    pub author: Author,
    pub raw_message: String,
    pub comment: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Review {
    pub fn formatted_vote(&self) -> String {
        format_vote(self.vote)
    }
}

/// One uploaded patch set of a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub id: String,
    pub number: u32,
    /// In message scan order.
    pub reviews: Vec<Review>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub number: u64,
    pub change_id: String,
    pub subject: String,
    pub project: String,
    /// Base URL of the Gerrit instance the change was fetched from.
    pub site: String,
    pub revisions: Vec<Revision>,
}

impl Change {
    pub fn title(&self) -> String {
        let short_id: String = self.change_id.chars().take(SHORT_ID_LEN).collect();
        format!("Change {short_id}: {}", self.subject)
    }

    pub fn permalink(&self) -> String {
        format!("{}/{}", self.site.trim_end_matches('/'), self.number)
    }
}
