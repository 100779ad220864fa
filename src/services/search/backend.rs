use super::LineMatch;
use crate::core::errors::{Error, Result};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

pub trait SearchBackend: Send + Sync {
    /// Every line under `root` containing `literal`, sorted by path then line.
    /// Gives up with a search error once `cancel` is raised.
    fn search_until(&self, root: &Path, literal: &str, cancel: &AtomicBool)
        -> Result<Vec<LineMatch>>;

    fn search(&self, root: &Path, literal: &str) -> Result<Vec<LineMatch>> {
        self.search_until(root, literal, &AtomicBool::new(false))
    }
}

/// Checked between files so an abandoned search stops touching the working copy.
pub(crate) fn check_cancelled(root: &Path, cancel: &AtomicBool) -> Result<()> {
    if cancel.load(Ordering::Relaxed) {
        return Err(Error::Search {
            path: root.to_path_buf(),
            reason: "search cancelled".into(),
        });
    }
    Ok(())
}
