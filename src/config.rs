use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::assembler::VoteStrategy;
use crate::cli::Cli;
use crate::error::{Error, Result};

pub const DEFAULT_CONFIG_PATH: &str = "review-reporter.toml";
pub const DEFAULT_GERRIT_URL: &str = "https://review.openstack.org";
pub const DEFAULT_REVIEWER_DOMAIN: &str = "@lsd.ufcg.edu.br";
const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 4;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Settings read from the TOML file. The Redmine API key only comes from the
/// environment or the command line.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub gerrit_url: Option<String>,
    pub redmine_url: Option<String>,
    pub redmine_project: Option<String>,
    pub input_page: Option<String>,
    pub reviewer_domain: Option<String>,
    pub vote_strategy: Option<VoteStrategy>,
    pub max_concurrent_fetches: Option<usize>,
    pub request_timeout: Option<u64>,
    pub dry_run: Option<bool>,
    pub std_out: Option<bool>,
    pub ignore_should_be_updated: Option<bool>,
}

#[derive(Clone, PartialEq)]
pub struct Config {
    pub gerrit_url: String,
    pub redmine_url: String,
    pub redmine_project: String,
    pub redmine_key: String,
    pub input_page: String,
    pub reviewer_domain: String,
    pub vote_strategy: VoteStrategy,
    pub max_concurrent_fetches: usize,
    /// Seconds.
    pub request_timeout: u64,
    pub dry_run: bool,
    pub std_out: bool,
    pub ignore_should_be_updated: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("gerrit_url", &self.gerrit_url)
            .field("redmine_url", &self.redmine_url)
            .field("redmine_project", &self.redmine_project)
            .field("redmine_key", &"<redacted>")
            .field("input_page", &self.input_page)
            .field("reviewer_domain", &self.reviewer_domain)
            .field("vote_strategy", &self.vote_strategy)
            .field("max_concurrent_fetches", &self.max_concurrent_fetches)
            .field("request_timeout", &self.request_timeout)
            .field("dry_run", &self.dry_run)
            .field("std_out", &self.std_out)
            .field("ignore_should_be_updated", &self.ignore_should_be_updated)
            .finish()
    }
}

impl Config {
    /// Resolve settings from defaults, the config file, the environment and
    /// the command line, later sources winning.
    ///
    /// An explicit `--config` must exist; the default file is optional.
    pub fn load(cli: &Cli) -> Result<Self> {
        let file_config = match cli.config.as_deref() {
            Some(path) => {
                let path = Path::new(path);
                if !path.exists() {
                    return Err(Error::ConfigNotFound(path.to_path_buf()));
                }
                parse_config(&std::fs::read_to_string(path)?)?
            }
            None => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    parse_config(&std::fs::read_to_string(path)?)?
                } else {
                    ConfigFile::default()
                }
            }
        };

        merge(file_config, cli)
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            gerrit_url: DEFAULT_GERRIT_URL.to_string(),
            redmine_url: "https://redmine.example.org".to_string(),
            redmine_project: "reviews".to_string(),
            redmine_key: "secret".to_string(),
            input_page: "Input".to_string(),
            reviewer_domain: DEFAULT_REVIEWER_DOMAIN.to_string(),
            vote_strategy: VoteStrategy::Label,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
            dry_run: false,
            std_out: false,
            ignore_should_be_updated: false,
        }
    }
}

pub fn parse_config(content: &str) -> Result<ConfigFile> {
    let config: ConfigFile = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &ConfigFile) -> Result<()> {
    if let Some(limit) = config.max_concurrent_fetches
        && limit == 0
    {
        return Err(Error::ConfigValidation(
            "max_concurrent_fetches must be > 0".to_string(),
        ));
    }
    if let Some(timeout) = config.request_timeout
        && timeout == 0
    {
        return Err(Error::ConfigValidation(
            "request_timeout must be > 0".to_string(),
        ));
    }
    Ok(())
}

fn required(value: Option<String>, name: &str, hint: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::ConfigValidation(format!("{name} is required ({hint})"))),
    }
}

pub fn merge(file: ConfigFile, cli: &Cli) -> Result<Config> {
    let max_concurrent_fetches = cli
        .max_concurrent_fetches
        .or(file.max_concurrent_fetches)
        .unwrap_or(DEFAULT_MAX_CONCURRENT_FETCHES);
    if max_concurrent_fetches == 0 {
        return Err(Error::ConfigValidation(
            "max_concurrent_fetches must be > 0".to_string(),
        ));
    }
    let request_timeout = cli
        .request_timeout
        .or(file.request_timeout)
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    if request_timeout == 0 {
        return Err(Error::ConfigValidation(
            "request_timeout must be > 0".to_string(),
        ));
    }

    Ok(Config {
        gerrit_url: cli
            .gerrit_url
            .clone()
            .or(file.gerrit_url)
            .unwrap_or_else(|| DEFAULT_GERRIT_URL.to_string()),
        redmine_url: required(
            cli.redmine_url.clone().or(file.redmine_url),
            "redmine_url",
            "--redmine-url or REDMINE_ADDRESS",
        )?,
        redmine_project: required(
            cli.project.clone().or(file.redmine_project),
            "redmine_project",
            "--project or REDMINE_PROJECT",
        )?,
        redmine_key: required(
            cli.redmine_key.clone(),
            "redmine_key",
            "--redmine-key or REDMINE_KEY",
        )?,
        input_page: required(
            cli.input_page.clone().or(file.input_page),
            "input_page",
            "--input-page or REDMINE_INPUT_PAGE",
        )?,
        reviewer_domain: cli
            .reviewer_domain
            .clone()
            .or(file.reviewer_domain)
            .unwrap_or_else(|| DEFAULT_REVIEWER_DOMAIN.to_string()),
        vote_strategy: cli.vote_strategy.or(file.vote_strategy).unwrap_or_default(),
        max_concurrent_fetches,
        request_timeout,
        dry_run: cli.dry_run || file.dry_run.unwrap_or(false),
        std_out: cli.std_out || file.std_out.unwrap_or(false),
        ignore_should_be_updated: cli.ignore_should_be_updated
            || file.ignore_should_be_updated.unwrap_or(false),
    })
}
