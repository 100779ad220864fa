//! Literal text search over a local working copy.

pub mod backend;
pub mod git_grep;
pub mod literal;

use std::path::Path;
use std::sync::Arc;

pub use backend::SearchBackend;
pub use git_grep::GitGrepBackend;
pub use literal::LiteralBackend;

/// A single matching line, relative to the searched working copy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct LineMatch {
    /// `/`-separated path relative to the working copy root.
    pub path: String,
    /// 1-based.
    pub line_number: u64,
    pub line: String,
}

/// Selects how working copies are searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum EngineKind {
    /// In-process search with the `grep` crate.
    #[default]
    Native,
    /// Shell out to `git grep`.
    GitGrep,
}

pub fn backend_for(kind: EngineKind) -> Arc<dyn SearchBackend> {
    match kind {
        EngineKind::Native => Arc::new(LiteralBackend::new()),
        EngineKind::GitGrep => Arc::new(GitGrepBackend::new()),
    }
}

/// Converts a path below `root` into the `/`-separated form used in links.
pub(crate) fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
