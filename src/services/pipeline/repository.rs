use futures::stream::{self, StreamExt};

use super::{BranchOutcome, Pipeline, RunSummary};
use crate::models::{MatchRow, Repository};
use crate::services::checkout::Checkout;
use crate::services::source::SourceControl;

/// Rows and counters for one repository, all branches merged.
#[derive(Debug, Clone)]
pub struct RepositoryOutcome {
    pub repository: String,
    pub rows: Vec<MatchRow>,
    pub summary: RunSummary,
}

impl RepositoryOutcome {
    fn new(repository: &str) -> Self {
        Self {
            repository: repository.to_string(),
            rows: Vec::new(),
            summary: RunSummary {
                repositories: 1,
                ..RunSummary::default()
            },
        }
    }

    fn skipped(repository: &str) -> Self {
        let mut outcome = Self::new(repository);
        outcome.summary.repositories_skipped = 1;
        outcome
    }

    fn absorb(&mut self, branch: BranchOutcome) {
        self.summary.record_branch(&branch);
        self.rows.extend(branch.rows);
    }
}

impl<S: SourceControl, C: Checkout> Pipeline<S, C> {
    /// Searches every branch of `repository`, at most `branch_workers` at a time.
    pub async fn search_repository(&self, repository: &Repository) -> RepositoryOutcome {
        let branches = match self
            .source
            .list_branches(&self.config.organization, repository)
            .await
        {
            Ok(branches) => branches,
            Err(e) => {
                tracing::warn!("Error processing repo {}: {}", repository.name, e);
                return RepositoryOutcome::skipped(&repository.name);
            }
        };

        let clone_url = self.source.clone_url(repository);
        let mut outcome = RepositoryOutcome::new(&repository.name);
        let mut branch_results = stream::iter(
            branches
                .iter()
                .map(|branch| self.search_branch(repository, &branch.name, &clone_url)),
        )
        .buffer_unordered(self.config.branch_workers);

        while let Some(branch) = branch_results.next().await {
            outcome.absorb(branch);
        }

        tracing::debug!(
            "{}: {} branches, {} matches",
            repository.name,
            outcome.summary.branches,
            outcome.rows.len()
        );
        outcome
    }
}
