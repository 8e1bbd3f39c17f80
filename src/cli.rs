use clap::Parser;

use crate::assembler::VoteStrategy;

/// review-reporter: publish Gerrit code-review activity as Redmine wiki reports
#[derive(Parser, Debug, Clone)]
#[command(name = "review-reporter", version, about)]
pub struct Cli {
    /// Do not write reports back to Redmine
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print every report on standard output
    #[arg(short = 's', long)]
    pub std_out: bool,

    /// Ignore the "Should be updated" column and update every report. Use with caution!
    #[arg(short = 'I', long)]
    pub ignore_should_be_updated: bool,

    /// Path to config file (default: review-reporter.toml, if present)
    #[arg(long)]
    pub config: Option<String>,

    /// Gerrit base URL (default: https://review.openstack.org)
    #[arg(long)]
    pub gerrit_url: Option<String>,

    /// Redmine base URL
    #[arg(long, env = "REDMINE_ADDRESS")]
    pub redmine_url: Option<String>,

    /// Redmine REST API key
    #[arg(long, env = "REDMINE_KEY", hide_env_values = true)]
    pub redmine_key: Option<String>,

    /// Redmine project holding the wiki
    #[arg(long, env = "REDMINE_PROJECT")]
    pub project: Option<String>,

    /// Title of the wiki page listing the reports to generate
    #[arg(long, env = "REDMINE_INPUT_PAGE")]
    pub input_page: Option<String>,

    /// Email suffix identifying the team's reviewers (default: @lsd.ufcg.edu.br)
    #[arg(long)]
    pub reviewer_domain: Option<String>,

    /// Where review votes are read from (default: label)
    #[arg(long, value_enum)]
    pub vote_strategy: Option<VoteStrategy>,

    /// Maximum number of changes fetched from Gerrit at once (default: 4)
    #[arg(long)]
    pub max_concurrent_fetches: Option<usize>,

    /// Per-request HTTP timeout in seconds (default: 30)
    #[arg(long)]
    pub request_timeout: Option<u64>,
}
