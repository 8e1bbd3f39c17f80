use std::collections::BTreeMap;

use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};

use crate::error::{Error, Result};

/// Change detail. Fields a report cannot do without stay required and surface
/// as `MalformedPayload` when missing.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeDocument {
    #[serde(rename = "_number", alias = "number")]
    pub number: u64,
    #[serde(rename = "change_id", alias = "change_identifier")]
    pub change_id: String,
    pub subject: String,
    pub project: String,
    /// Keyed by revision id; the revision bodies are fetched separately.
    #[serde(default)]
    pub revisions: BTreeMap<String, IgnoredAny>,
    #[serde(default)]
    pub messages: Vec<MessageDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageDocument {
    /// Absent on messages Gerrit itself posts.
    #[serde(default)]
    pub author: Option<AccountDocument>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(rename = "_revision_number", alias = "revision_number", default)]
    pub revision_number: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountDocument {
    #[serde(default)]
    pub username: Option<String>,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Review detail. Abandoned changes may carry no labels at all.
#[derive(Debug, Clone, Deserialize)]
pub struct RevisionDocument {
    pub id: String,
    #[serde(default)]
    pub revisions: BTreeMap<String, RevisionNumberDocument>,
    #[serde(default)]
    pub labels: LabelsDocument,
}

impl RevisionDocument {
    /// Patch set number of the revision this document describes.
    ///
    /// The review endpoint nests it under `revisions.<id>._number`; when the
    /// key does not match the document id the first entry is used.
    pub fn sequence_number(&self) -> Result<u32> {
        self.revisions
            .get(&self.id)
            .or_else(|| self.revisions.values().next())
            .map(|r| r.number)
            .ok_or_else(|| {
                Error::MalformedPayload(format!(
                    "revision {} has no patch set number",
                    self.id
                ))
            })
    }

    /// `Code-Review` votes, empty when the label is missing.
    pub fn code_review_votes(&self) -> &[LabelVoteDocument] {
        self.labels
            .code_review
            .as_ref()
            .map(|label| label.all.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevisionNumberDocument {
    #[serde(rename = "_number", alias = "sequence_number")]
    pub number: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelsDocument {
    #[serde(rename = "Code-Review", default)]
    pub code_review: Option<LabelDocument>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelDocument {
    #[serde(default)]
    pub all: Vec<LabelVoteDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelVoteDocument {
    #[serde(default)]
    pub username: Option<String>,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub value: i8,
}

/// Deserialize a fetched document, mapping schema violations to `MalformedPayload`.
pub fn decode<T: DeserializeOwned>(what: &str, value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::MalformedPayload(format!("{what}: {e}")))
}
