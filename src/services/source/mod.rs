//! Source-control service: identity, repository and branch enumeration.

pub mod github;

use std::future::Future;

use crate::core::errors::Result;
use crate::models::{Branch, Repository};

pub use github::GithubClient;

pub trait SourceControl: Send + Sync {
    /// Login of the account the credential belongs to.
    fn current_login(&self) -> impl Future<Output = Result<String>> + Send;

    /// Every repository of `organization`. A rejected credential is `Error::Auth`.
    fn list_repositories(
        &self,
        organization: &str,
    ) -> impl Future<Output = Result<Vec<Repository>>> + Send;

    fn list_branches(
        &self,
        organization: &str,
        repository: &Repository,
    ) -> impl Future<Output = Result<Vec<Branch>>> + Send;

    /// URL handed to `git clone`, carrying credentials if needed.
    fn clone_url(&self, repository: &Repository) -> String;
}
