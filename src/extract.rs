use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

use crate::error::{Error, Result};

/// `Patch Set N: Code-Review±V`, optionally followed by a blank line and text.
static VOTE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^Patch Set \d+: Code-Review([+-][12])(?:\n\n(.*))?$").unwrap()
});

/// `Patch Set N:` followed by whitespace and the rest of the message.
static PLAIN_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^Patch Set \d+:(?:\s(.*))?$").unwrap());

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Vote carried in the message header, or `fallback` when the header has none.
pub fn extract_vote(message: &str, fallback: i8) -> i8 {
    VOTE_HEADER
        .captures(message.trim())
        .and_then(|caps| caps[1].parse::<i8>().ok())
        .unwrap_or(fallback)
}

/// Reviewer text with the `Patch Set N:` header and any vote removed.
///
/// With a vote the text follows the header after a blank line. Without one it
/// follows the colon directly, on the same line or after a blank line.
pub fn extract_comment(message: &str) -> String {
    let message = message.trim();

    if let Some(caps) = VOTE_HEADER.captures(message) {
        return caps
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
    }

    if let Some(caps) = PLAIN_HEADER.captures(message) {
        return caps
            .get(1)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
    }

    message.to_string()
}

/// Render a vote the way Gerrit shows it: `+2`, `+1`, `0`, `-1`, `-2`.
pub fn format_vote(vote: i8) -> String {
    if vote > 0 {
        format!("+{vote}")
    } else {
        vote.to_string()
    }
}

/// Parse a Gerrit timestamp (`yyyy-mm-dd hh:mm:ss.fffffffff`, always UTC).
///
/// The fractional part is truncated rather than rounded.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let whole_seconds = match raw.rsplit_once('.') {
        Some((prefix, _fraction)) => prefix,
        None => raw,
    };

    NaiveDateTime::parse_from_str(whole_seconds.trim(), TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::MalformedTimestamp(format!("'{raw}': {e}")))
}
