use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("authentication rejected: {0}")]
    Auth(String),
    #[error("failed to enumerate {scope}: {reason}")]
    Enumeration { scope: String, reason: String },
    #[error("failed to clone branch '{branch}': {reason}")]
    Clone { branch: String, reason: String },
    #[error("search failed in {}: {reason}", path.display())]
    Search { path: PathBuf, reason: String },
    #[error("{operation} timed out after {}s", elapsed.as_secs())]
    Timeout {
        operation: &'static str,
        elapsed: Duration,
    },
    #[error("failed to remove {}: {source}", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write report to {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },
    #[error("mail error: {0}")]
    Mail(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("other error: {0}")]
    Other(String),
}

impl Error {
    /// Whether this error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_) | Error::Auth(_) | Error::Write { .. })
    }
}
