use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::extract::{extract_comment, extract_vote, parse_timestamp};
use crate::gerrit::GerritClient;
use crate::gerrit::payload::{
    ChangeDocument, LabelVoteDocument, MessageDocument, RevisionDocument, decode,
};
use crate::model::{Author, Change, Review, Revision};

/// Where a review's vote comes from.
///
/// Older Gerrit deployments expose reliable `Code-Review` label records; newer
/// ones are easier to read from the message header alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VoteStrategy {
    /// The label value is the vote unless the message header carries one.
    #[default]
    Label,
    /// The vote is read from the message header only; no header means 0.
    Message,
}

impl VoteStrategy {
    fn fallback_vote(self, label: &LabelVoteDocument) -> i8 {
        match self {
            VoteStrategy::Label => label.value,
            VoteStrategy::Message => 0,
        }
    }
}

/// Builds the `Change` tree for a change number from raw Gerrit documents.
#[derive(Clone)]
pub struct ChangeAssembler {
    client: Arc<dyn GerritClient>,
    strategy: VoteStrategy,
}

impl ChangeAssembler {
    pub fn new(client: Arc<dyn GerritClient>, strategy: VoteStrategy) -> Self {
        Self { client, strategy }
    }

    /// Fetch and assemble one change. Any failure discards the whole change.
    pub fn assemble(&self, number: &str) -> Result<Change> {
        info!(change = number, "fetching change");
        let change: ChangeDocument =
            decode(&format!("change {number}"), self.client.fetch_change(number)?)?;
        debug!(change = number, subject = %change.subject, "change fetched");

        let mut revisions = Vec::with_capacity(change.revisions.len());
        for revision_id in change.revisions.keys() {
            info!(change = number, revision = %revision_id, "fetching revision");
            let revision: RevisionDocument = decode(
                &format!("revision {revision_id} of change {number}"),
                self.client.fetch_revision(number, revision_id)?,
            )?;
            revisions.push(self.assemble_revision(&change, revision)?);
        }
        revisions.sort_by_key(|r| r.number);

        Ok(Change {
            number: change.number,
            change_id: change.change_id,
            subject: change.subject,
            project: change.project,
            site: self.client.site().to_string(),
            revisions,
        })
    }

    fn assemble_revision(
        &self,
        change: &ChangeDocument,
        revision: RevisionDocument,
    ) -> Result<Revision> {
        let number = revision.sequence_number()?;
        let messages: Vec<&MessageDocument> = change
            .messages
            .iter()
            .filter(|m| m.revision_number == Some(number))
            .collect();

        let reviews = collect_reviews(revision.code_review_votes(), &messages, self.strategy)?;
        debug!(
            revision = %revision.id,
            patch_set = number,
            reviews = reviews.len(),
            "revision assembled"
        );

        Ok(Revision {
            id: revision.id,
            number,
            reviews,
        })
    }

    /// Assemble many changes, at most `max_concurrent` in flight at once.
    ///
    /// Changes that fail are logged and left out; the rest keep the order of
    /// `numbers`.
    pub async fn assemble_all(&self, numbers: &[String], max_concurrent: usize) -> Vec<Change> {
        let concurrency = Arc::new(Semaphore::new(max_concurrent.max(1)));
        let mut join_set = tokio::task::JoinSet::new();

        for (index, number) in numbers.iter().enumerate() {
            let assembler = self.clone();
            let concurrency = Arc::clone(&concurrency);
            let number = number.clone();

            join_set.spawn(async move {
                let _permit = concurrency
                    .acquire()
                    .await
                    .expect("concurrency semaphore closed unexpectedly");
                let task_number = number.clone();
                let result =
                    tokio::task::spawn_blocking(move || assembler.assemble(&task_number)).await;
                (index, number, result)
            });
        }

        let mut assembled = Vec::with_capacity(numbers.len());
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, _, Ok(Ok(change)))) => assembled.push((index, change)),
                Ok((_, number, Ok(Err(e)))) => {
                    warn!(change = %number, error = %e, "skipping change");
                }
                Ok((_, number, Err(e))) => {
                    warn!(change = %number, error = %e, "change assembly task failed");
                }
                Err(e) => warn!(error = %e, "change assembly task failed"),
            }
        }

        assembled.sort_by_key(|(index, _)| *index);
        assembled.into_iter().map(|(_, change)| change).collect()
    }
}

/// One review per message whose author holds a `Code-Review` label entry.
///
/// Both strategies pick the same messages; they differ only in the vote used
/// when the message header has none.
fn collect_reviews(
    votes: &[LabelVoteDocument],
    messages: &[&MessageDocument],
    strategy: VoteStrategy,
) -> Result<Vec<Review>> {
    let mut reviews = Vec::new();
    for message in messages {
        let Some(message_author) = &message.author else {
            debug!("skipping message without author");
            continue;
        };
        let Some(vote) = votes.iter().find(|v| v.name == message_author.name) else {
            continue;
        };
        let author = Author {
            username: vote.username.clone(),
            name: vote.name.clone(),
            email: vote.email.clone(),
        };
        reviews.push(build_review(author, message, strategy.fallback_vote(vote))?);
    }
    Ok(reviews)
}

fn build_review(author: Author, message: &MessageDocument, fallback_vote: i8) -> Result<Review> {
    let timestamp = message.date.as_deref().map(parse_timestamp).transpose()?;
    Ok(Review {
        vote: extract_vote(&message.message, fallback_vote),
        comment: extract_comment(&message.message),
        raw_message: message.message.clone(),
        author,
        timestamp,
    })
}
