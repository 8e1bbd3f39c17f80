use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{Change, Review, Revision};
use crate::report::ReportItem;

const REPORT_TEMPLATE_NAME: &str = "report";

const REPORT_TEMPLATE: &str = "\
h1. {{ title }}

table{border:1px bordercolor:darkblue}.
|_{background:#ffa}.Reviewer|_{background:#ffa}.Review|_{background:#ffa}.Project|_{background:#ffa}.Patch|_{background:#ffa}.Revision score|_{background:#ffa}.Comment|
{{ change_rows }}

Last updated on: {{ updated_at }}";

const UPDATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

/// A review selected for a report, with the change and revision it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct ReportEntry<'a> {
    pub change: &'a Change,
    pub revision: &'a Revision,
    pub review: &'a Review,
}

impl ReportEntry<'_> {
    /// `|Reviewer|"Title":link|Project|Patch|Score|Comment|`
    pub fn table_row(&self) -> String {
        let cells = [
            self.review.author.first_name().to_string(),
            format!("\"{}\":{}", self.change.title(), self.change.permalink()),
            self.change.project.clone(),
            self.revision.number.to_string(),
            self.review.formatted_vote(),
            self.review.comment.replace('\n', " "),
        ];
        format!("|{}|", cells.join("|"))
    }
}

/// Which reviews belong in a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewFilter {
    /// Suffix every reviewer email must end with, e.g. `@lsd.ufcg.edu.br`.
    pub email_domain: String,
    pub from_date: Option<NaiveDate>,
    pub until_date: Option<NaiveDate>,
}

impl ReviewFilter {
    pub fn for_item(item: &ReportItem, email_domain: &str) -> Self {
        Self {
            email_domain: email_domain.to_string(),
            from_date: item.from_date,
            until_date: item.until_date,
        }
    }

    /// Date bounds compare against midnight UTC of the given day.
    pub fn accepts(&self, review: &Review) -> bool {
        if !review.author.has_email_domain(&self.email_domain) {
            return false;
        }
        let after_start = match (self.from_date, review.timestamp) {
            (None, _) => true,
            (Some(from), Some(ts)) => start_of_day(from) <= ts,
            (Some(_), None) => false,
        };
        let before_end = match (self.until_date, review.timestamp) {
            (None, _) => true,
            (Some(until), Some(ts)) => ts <= start_of_day(until),
            (Some(_), None) => false,
        };
        after_start && before_end
    }

    /// Accepted reviews in change, revision, review order.
    pub fn select<'a>(&self, changes: &'a [Change]) -> Vec<ReportEntry<'a>> {
        changes
            .iter()
            .flat_map(|change| {
                change.revisions.iter().flat_map(move |revision| {
                    revision.reviews.iter().map(move |review| ReportEntry {
                        change,
                        revision,
                        review,
                    })
                })
            })
            .filter(|entry| self.accepts(entry.review))
            .collect()
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

#[derive(Serialize)]
struct ReportContext<'a> {
    title: &'a str,
    change_rows: String,
    updated_at: String,
}

/// Renders report pages as Textile with CRLF line endings.
pub struct ReportRenderer {
    engine: upon::Engine<'static>,
}

impl ReportRenderer {
    pub fn new() -> Result<Self> {
        let mut engine = upon::Engine::new();
        engine
            .add_template(REPORT_TEMPLATE_NAME, REPORT_TEMPLATE)
            .map_err(|e| Error::Template(e.to_string()))?;
        Ok(Self { engine })
    }

    pub fn render(
        &self,
        title: &str,
        entries: &[ReportEntry<'_>],
        updated_at: DateTime<Utc>,
    ) -> Result<String> {
        let context = ReportContext {
            title,
            change_rows: entries
                .iter()
                .map(ReportEntry::table_row)
                .collect::<Vec<_>>()
                .join("\n"),
            updated_at: updated_at.format(UPDATED_AT_FORMAT).to_string(),
        };

        let text = self
            .engine
            .template(REPORT_TEMPLATE_NAME)
            .render(&context)
            .to_string()
            .map_err(|e| Error::Template(e.to_string()))?;

        Ok(text.replace('\n', "\r\n"))
    }
}
