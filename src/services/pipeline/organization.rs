use futures::stream::{self, StreamExt};
use time::OffsetDateTime;

use super::{Pipeline, RunSummary, SearchRun};
use crate::core::errors::Result;
use crate::core::telemetry::progress::RepoProgress;
use crate::models::run_metadata::format_utc;
use crate::models::{RunMetadata, UNKNOWN_IDENTITY};
use crate::services::checkout::Checkout;
use crate::services::source::SourceControl;

impl<S: SourceControl, C: Checkout> Pipeline<S, C> {
    /// Searches every repository of the configured organization.
    ///
    /// Only a rejected credential aborts; every other failure shrinks
    /// coverage and is reflected in the returned summary.
    pub async fn search_organization(&self) -> Result<SearchRun> {
        let started_at = OffsetDateTime::now_utc();
        let organization = &self.config.organization;

        let identity = match self.source.current_login().await {
            Ok(login) => login,
            Err(e) => {
                tracing::error!("Failed to get user: {}", e);
                UNKNOWN_IDENTITY.to_string()
            }
        };

        tracing::info!("Started search at: {}", format_utc(started_at));
        tracing::info!("User: {}", identity);
        tracing::info!("Organization: {}", organization);
        tracing::info!("Search String: {}", self.config.pattern);

        let repositories = match self.source.list_repositories(organization).await {
            Ok(repositories) => repositories,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!("Could not list repositories of {}: {}", organization, e);
                Vec::new()
            }
        };
        tracing::info!("Found {} repositories to process", repositories.len());

        let progress = if self.show_progress {
            RepoProgress::new(repositories.len())
        } else {
            RepoProgress::hidden(repositories.len())
        };

        let mut rows = Vec::new();
        let mut summary = RunSummary::default();
        let mut repo_results = stream::iter(
            repositories
                .iter()
                .map(|repository| self.search_repository(repository)),
        )
        .buffer_unordered(self.config.repo_workers);

        while let Some(outcome) = repo_results.next().await {
            progress.tick(&outcome.repository);
            summary.merge(&outcome.summary);
            rows.extend(outcome.rows);
        }
        progress.finish();

        tracing::info!(
            "Search completed. Found {} matches across {} repositories",
            rows.len(),
            repositories.len()
        );
        tracing::info!(
            "Coverage: {} of {} branches searched ({} clone failures, {} search failures, {} timeouts, {} repositories skipped)",
            summary.branches_searched,
            summary.branches,
            summary.clone_failures,
            summary.search_failures,
            summary.timeouts,
            summary.repositories_skipped
        );

        let metadata = RunMetadata::new(
            started_at,
            identity,
            organization.as_str(),
            self.config.pattern.as_str(),
            self.config.repo_workers,
        );

        Ok(SearchRun {
            rows,
            metadata,
            summary,
        })
    }
}
