use chrono::NaiveDate;
use tracing::warn;

use crate::error::{Error, Result};
use crate::wiki_table::{TableRow, WikiTable};

pub const COLUMN_WIKI_PAGE: &str = "Wiki page";
pub const COLUMN_SPRINT: &str = "Sprint";
pub const COLUMN_FROM: &str = "From";
pub const COLUMN_UNTIL: &str = "Until";
pub const COLUMN_SHOULD_BE_UPDATED: &str = "Should be updated";
pub const COLUMN_REVIEW_NUMBERS: &str = "Review numbers";

const INPUT_COLUMNS: [&str; 6] = [
    COLUMN_WIKI_PAGE,
    COLUMN_SPRINT,
    COLUMN_FROM,
    COLUMN_UNTIL,
    COLUMN_SHOULD_BE_UPDATED,
    COLUMN_REVIEW_NUMBERS,
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A row of the input table, cell text as written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportRow {
    pub wiki_page: String,
    pub sprint: String,
    pub from_date: String,
    pub until_date: String,
    pub should_be_updated: String,
    pub review_numbers: String,
}

impl ReportRow {
    fn from_table_row(row: &TableRow) -> Self {
        let cell = |column: &str| row.get(column).unwrap_or_default().to_string();
        Self {
            wiki_page: cell(COLUMN_WIKI_PAGE),
            sprint: cell(COLUMN_SPRINT),
            from_date: cell(COLUMN_FROM),
            until_date: cell(COLUMN_UNTIL),
            should_be_updated: cell(COLUMN_SHOULD_BE_UPDATED),
            review_numbers: cell(COLUMN_REVIEW_NUMBERS),
        }
    }
}

/// Parse the input page's table into raw rows.
pub fn parse_report_rows(wiki_text: &str) -> Result<Vec<ReportRow>> {
    let table = WikiTable::parse(wiki_text, Some(COLUMN_WIKI_PAGE))?;
    table.require_columns(&INPUT_COLUMNS)?;
    Ok(table.rows().iter().map(ReportRow::from_table_row).collect())
}

/// A validated request for one report page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportItem {
    pub wiki_page: String,
    pub sprint: String,
    pub from_date: Option<NaiveDate>,
    pub until_date: Option<NaiveDate>,
    pub should_be_updated: bool,
    pub review_numbers: Vec<String>,
}

impl TryFrom<&ReportRow> for ReportItem {
    type Error = Error;

    fn try_from(row: &ReportRow) -> Result<Self> {
        // The date window is only read when a start date is given; an until
        // date on its own is ignored.
        let (from_date, until_date) = if row.from_date.is_empty() {
            (None, None)
        } else {
            (
                Some(parse_date(&row.from_date)?),
                optional_date(&row.until_date)?,
            )
        };

        Ok(Self {
            wiki_page: row.wiki_page.clone(),
            sprint: row.sprint.clone(),
            from_date,
            until_date,
            should_be_updated: !row.wiki_page.is_empty()
                && row.should_be_updated.eq_ignore_ascii_case("yes"),
            review_numbers: row
                .review_numbers
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        })
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| Error::TableParse(format!("invalid date '{raw}' (expected YYYY-MM-DD): {e}")))
}

fn optional_date(raw: &str) -> Result<Option<NaiveDate>> {
    if raw.trim().is_empty() {
        Ok(None)
    } else {
        parse_date(raw).map(Some)
    }
}

/// Parse the input page into report items.
///
/// A page without the expected table is an error. A row with an unparseable
/// date is logged and left out.
pub fn parse_input_page(wiki_text: &str) -> Result<Vec<ReportItem>> {
    let rows = parse_report_rows(wiki_text)?;
    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        match ReportItem::try_from(row) {
            Ok(item) => items.push(item),
            Err(e) => warn!(page = %row.wiki_page, error = %e, "skipping input row"),
        }
    }
    Ok(items)
}
