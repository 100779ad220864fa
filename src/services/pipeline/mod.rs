//! Organization-wide clone-and-search pipeline.
//!
//! ```text
//! search_organization   outer pool, one task per repository
//!     ↓
//! search_repository     inner pool, one task per branch
//!     ↓
//! search_branch         ephemeral clone + literal search
//! ```
//!
//! Workers never share mutable state. Every task hands back an outcome value
//! and the coordinator above it merges outcomes as they complete.

pub mod branch;
pub mod organization;
pub mod repository;

use std::sync::Arc;

use serde::Serialize;

use crate::core::config::RunConfig;
use crate::models::{MatchRow, RunMetadata};
use crate::services::checkout::Checkout;
use crate::services::search::SearchBackend;
use crate::services::source::SourceControl;

pub use branch::{BranchOutcome, BranchStatus};
pub use repository::RepositoryOutcome;

pub struct Pipeline<S, C> {
    config: Arc<RunConfig>,
    source: S,
    checkout: C,
    backend: Arc<dyn SearchBackend>,
    show_progress: bool,
}

impl<S: SourceControl, C: Checkout> Pipeline<S, C> {
    pub fn new(
        config: Arc<RunConfig>,
        source: S,
        checkout: C,
        backend: Arc<dyn SearchBackend>,
    ) -> Self {
        Self {
            config,
            source,
            checkout,
            backend,
            show_progress: false,
        }
    }

    /// Draw a progress bar over the repository count.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }
}

/// Counters describing how much of the organization was actually covered.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub repositories: usize,
    pub repositories_skipped: usize,
    pub branches: usize,
    pub branches_searched: usize,
    pub clone_failures: usize,
    pub search_failures: usize,
    pub timeouts: usize,
    pub matches: usize,
}

impl RunSummary {
    pub fn record_branch(&mut self, outcome: &BranchOutcome) {
        self.branches += 1;
        match outcome.status {
            BranchStatus::Searched => self.branches_searched += 1,
            BranchStatus::CloneFailed => self.clone_failures += 1,
            BranchStatus::SearchFailed => self.search_failures += 1,
            BranchStatus::TimedOut => self.timeouts += 1,
        }
        self.matches += outcome.rows.len();
    }

    pub fn merge(&mut self, other: &RunSummary) {
        self.repositories += other.repositories;
        self.repositories_skipped += other.repositories_skipped;
        self.branches += other.branches;
        self.branches_searched += other.branches_searched;
        self.clone_failures += other.clone_failures;
        self.search_failures += other.search_failures;
        self.timeouts += other.timeouts;
        self.matches += other.matches;
    }
}

/// Everything one run produced, ready for the report writer.
#[derive(Debug, Clone)]
pub struct SearchRun {
    pub rows: Vec<MatchRow>,
    pub metadata: RunMetadata,
    pub summary: RunSummary,
}
