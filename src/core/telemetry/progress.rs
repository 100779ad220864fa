//! Repository progress bar using indicatif.

use indicatif::{ProgressBar, ProgressStyle};

/// Counts completed repositories against the total found in the organization.
pub struct RepoProgress {
    bar: ProgressBar,
}

impl RepoProgress {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message("Processing repositories");
        Self { bar }
    }

    /// A progress reporter that draws nothing, for tests and non-interactive runs.
    pub fn hidden(total: usize) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total as u64);
        Self { bar }
    }

    /// Record one finished repository.
    pub fn tick(&self, repository: &str) {
        self.bar.set_message(format!("Processed {repository}"));
        self.bar.inc(1);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_advances_position() {
        let progress = RepoProgress::hidden(3);
        progress.tick("svc");
        progress.tick("web");
        assert_eq!(progress.position(), 2);
        progress.finish();
    }
}
