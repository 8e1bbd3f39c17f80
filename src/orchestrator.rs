use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::assembler::ChangeAssembler;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::redmine::Wiki;
use crate::render::{ReportRenderer, ReviewFilter};
use crate::report::{ReportItem, parse_input_page};

/// Receives the text of every rendered report when `std_out` is on.
pub trait ReportPrinter: Send + Sync {
    fn print_report(&self, title: &str, text: &str);
}

/// Default printer that writes to stdout.
pub struct StdoutPrinter;

impl ReportPrinter for StdoutPrinter {
    fn print_report(&self, title: &str, text: &str) {
        println!("\"{title}\"'s text:\n{text}");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Updated,
    WouldUpdate,
}

/// Per-run tally of report items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub updated: usize,
    pub would_update: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct Orchestrator<W, P = StdoutPrinter> {
    wiki: W,
    assembler: ChangeAssembler,
    renderer: ReportRenderer,
    config: Config,
    printer: P,
}

impl<W: Wiki> Orchestrator<W> {
    pub fn new(wiki: W, assembler: ChangeAssembler, config: Config) -> Result<Self> {
        Self::with_printer(wiki, assembler, config, StdoutPrinter)
    }
}

impl<W: Wiki, P: ReportPrinter> Orchestrator<W, P> {
    pub fn with_printer(
        wiki: W,
        assembler: ChangeAssembler,
        config: Config,
        printer: P,
    ) -> Result<Self> {
        Ok(Self {
            wiki,
            assembler,
            renderer: ReportRenderer::new()?,
            config,
            printer,
        })
    }

    /// Read the input page and refresh every report it asks for.
    ///
    /// Only a missing or unparseable input page fails the run. A report that
    /// cannot be rendered or written is logged and counted, and the run moves
    /// on to the next one.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunSummary> {
        info!(page = %self.config.input_page, "fetching input page");
        let input = self.wiki.get_page(&self.config.input_page)?;

        let items = parse_input_page(&input.text)?;
        info!(page = %input.title, count = items.len(), "input page parsed");

        let mut summary = RunSummary::default();
        for item in &items {
            if !self.wants_update(item) {
                info!(page = %item.wiki_page, "skipping report");
                summary.skipped += 1;
                continue;
            }

            match self.refresh_report(item, now).await {
                Ok(ItemOutcome::Updated) => summary.updated += 1,
                Ok(ItemOutcome::WouldUpdate) => summary.would_update += 1,
                Err(e) => {
                    warn!(page = %item.wiki_page, error = %e, "failed updating report");
                    summary.failed += 1;
                }
            }
        }

        info!(
            updated = summary.updated,
            would_update = summary.would_update,
            skipped = summary.skipped,
            failed = summary.failed,
            "run complete"
        );
        Ok(summary)
    }

    fn wants_update(&self, item: &ReportItem) -> bool {
        // A row without a page name has nowhere to write to.
        !item.wiki_page.is_empty()
            && (item.should_be_updated || self.config.ignore_should_be_updated)
    }

    async fn refresh_report(&self, item: &ReportItem, now: DateTime<Utc>) -> Result<ItemOutcome> {
        info!(
            page = %item.wiki_page,
            changes = item.review_numbers.len(),
            "fetching changes for report"
        );
        let changes = self
            .assembler
            .assemble_all(&item.review_numbers, self.config.max_concurrent_fetches)
            .await;

        let entries = ReviewFilter::for_item(item, &self.config.reviewer_domain).select(&changes);
        let text = self.renderer.render(&item.wiki_page, &entries, now)?;

        if self.config.std_out {
            self.printer.print_report(&item.wiki_page, &text);
        }

        if self.config.dry_run {
            info!(page = %item.wiki_page, reviews = entries.len(), "dry run, would update report");
            return Ok(ItemOutcome::WouldUpdate);
        }

        info!(page = %item.wiki_page, reviews = entries.len(), "updating report");
        if self.wiki.create_or_update(&item.wiki_page, &text)? {
            info!(page = %item.wiki_page, "report updated");
            Ok(ItemOutcome::Updated)
        } else {
            Err(Error::WikiWriteFailed(format!(
                "tracker did not accept the write to '{}'",
                item.wiki_page
            )))
        }
    }
}
