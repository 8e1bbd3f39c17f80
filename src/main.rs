use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use review_reporter::assembler::ChangeAssembler;
use review_reporter::cli::Cli;
use review_reporter::config::Config;
use review_reporter::gerrit::HttpGerritClient;
use review_reporter::orchestrator::Orchestrator;
use review_reporter::redmine::RedmineWiki;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging();

    info!("review-reporter starting");

    let config = match Config::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    info!(?config, "config loaded");

    let timeout = Duration::from_secs(config.request_timeout);
    let gerrit = HttpGerritClient::new(&config.gerrit_url, timeout);
    let assembler = ChangeAssembler::new(Arc::new(gerrit), config.vote_strategy);
    let wiki = RedmineWiki::new(
        &config.redmine_url,
        &config.redmine_project,
        &config.redmine_key,
        timeout,
    );

    let orchestrator = match Orchestrator::new(wiki, assembler, config) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = orchestrator.run(chrono::Utc::now()).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
