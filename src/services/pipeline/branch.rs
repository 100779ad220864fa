use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tempfile::TempDir;
use tokio::time::timeout;

use super::Pipeline;
use crate::core::errors::{Error, Result};
use crate::models::{MatchRow, Repository};
use crate::services::checkout::{redact_credentials, Checkout};
use crate::services::search::LineMatch;
use crate::services::source::SourceControl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchStatus {
    Searched,
    CloneFailed,
    SearchFailed,
    TimedOut,
}

/// What one branch contributed. Failed branches carry no rows.
#[derive(Debug, Clone)]
pub struct BranchOutcome {
    pub branch: String,
    pub status: BranchStatus,
    pub rows: Vec<MatchRow>,
}

impl BranchOutcome {
    pub fn searched(branch: &str, rows: Vec<MatchRow>) -> Self {
        Self {
            branch: branch.to_string(),
            status: BranchStatus::Searched,
            rows,
        }
    }

    pub fn failed(branch: &str, status: BranchStatus) -> Self {
        Self {
            branch: branch.to_string(),
            status,
            rows: Vec::new(),
        }
    }

    fn from_error(branch: &str, err: &Error, fallback: BranchStatus) -> Self {
        let status = match err {
            Error::Timeout { .. } => BranchStatus::TimedOut,
            _ => fallback,
        };
        Self::failed(branch, status)
    }
}

impl<S: SourceControl, C: Checkout> Pipeline<S, C> {
    /// Clones `branch` into a fresh temporary directory, searches it and
    /// removes the directory again on every path out.
    pub async fn search_branch(
        &self,
        repository: &Repository,
        branch: &str,
        clone_url: &str,
    ) -> BranchOutcome {
        let workdir = match tempfile::Builder::new().prefix("orgrep-").tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!(
                    "Could not create working copy for {}/{}: {}",
                    repository.name,
                    branch,
                    e
                );
                return BranchOutcome::failed(branch, BranchStatus::CloneFailed);
            }
        };

        let outcome = self
            .clone_and_search(repository, branch, clone_url, workdir.path())
            .await;
        release(workdir);
        outcome
    }

    async fn clone_and_search(
        &self,
        repository: &Repository,
        branch: &str,
        clone_url: &str,
        dest: &Path,
    ) -> BranchOutcome {
        if let Err(e) = self.clone_with_retries(clone_url, branch, dest).await {
            tracing::warn!("Error processing {}/{}: {}", repository.name, branch, e);
            return BranchOutcome::from_error(branch, &e, BranchStatus::CloneFailed);
        }

        match self.search_working_copy(dest).await {
            Ok(matches) => {
                tracing::debug!(
                    "{}/{}: {} matching lines",
                    repository.name,
                    branch,
                    matches.len()
                );
                let rows = matches
                    .into_iter()
                    .map(|m| self.to_row(repository, branch, m))
                    .collect();
                BranchOutcome::searched(branch, rows)
            }
            Err(e) => {
                tracing::warn!("Search failed for {}/{}: {}", repository.name, branch, e);
                BranchOutcome::from_error(branch, &e, BranchStatus::SearchFailed)
            }
        }
    }

    async fn clone_with_retries(&self, url: &str, branch: &str, dest: &Path) -> Result<()> {
        let attempts = self.config.clone_retries + 1;
        let mut last_error = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                tracing::debug!(
                    "Retrying clone of {} ({}/{})",
                    redact_credentials(url),
                    attempt,
                    attempts
                );
                reset_dir(dest)?;
            }
            let limit = self.config.clone_timeout;
            match timeout(limit, self.checkout.shallow_clone(url, branch, dest)).await {
                Ok(Ok(())) => return Ok(()),
                Ok(Err(e)) => last_error = Some(e),
                Err(_) => {
                    last_error = Some(Error::Timeout {
                        operation: "clone",
                        elapsed: limit,
                    })
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Clone {
            branch: branch.to_string(),
            reason: "no clone attempt was made".into(),
        }))
    }

    /// Runs the backend on the blocking pool. On timeout the backend is told
    /// to stop before the working copy is released.
    async fn search_working_copy(&self, root: &Path) -> Result<Vec<LineMatch>> {
        let backend = self.backend.clone();
        let root_owned = root.to_path_buf();
        let literal = self.config.pattern.clone();
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = cancel.clone();
        let task = tokio::task::spawn_blocking(move || {
            backend.search_until(&root_owned, &literal, &flag)
        });

        let limit = self.config.search_timeout;
        match timeout(limit, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(Error::Search {
                path: root.to_path_buf(),
                reason: format!("search task failed: {join_error}"),
            }),
            Err(_) => {
                cancel.store(true, Ordering::Relaxed);
                Err(Error::Timeout {
                    operation: "search",
                    elapsed: limit,
                })
            }
        }
    }

    fn to_row(&self, repository: &Repository, branch: &str, found: LineMatch) -> MatchRow {
        MatchRow::new(
            &self.config.host,
            &self.config.organization,
            &repository.name,
            branch,
            &found.path,
            found.line_number,
        )
    }
}

fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Removes the working copy. Failures are logged, never returned.
fn release(workdir: TempDir) {
    let path = workdir.path().to_path_buf();
    if let Err(source) = workdir.close() {
        tracing::warn!("{}", Error::Cleanup { path, source });
    }
}
