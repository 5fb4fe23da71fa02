use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the transformation engine, clipboard access and the session.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to parse config {path}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    #[error("Unknown transformation rule: {0}")]
    UnknownRule(String),

    #[error("Invalid regex pattern in rule '{rule_id}': {source}")]
    RegexCompile {
        rule_id: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid rule '{rule_id}': {reason}")]
    InvalidRule { rule_id: String, reason: String },

    #[error("Clipboard access failed: {0}")]
    ClipboardAccess(String),

    #[error("Content too large: {size} bytes exceeds the {limit} byte limit")]
    ContentTooLarge { size: usize, limit: usize },

    #[error("Clipboard monitor stopped after {failures} consecutive read failures: {last_error}")]
    MonitorDegraded { failures: u32, last_error: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn config_parse(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::ConfigParse {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
