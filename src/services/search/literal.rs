use super::backend::{check_cancelled, SearchBackend};
use super::{relative_path, LineMatch};
use crate::core::errors::{Error, Result};
use grep::regex::RegexMatcherBuilder;
use grep::searcher::{BinaryDetection, Searcher, SearcherBuilder, Sink, SinkMatch};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use walkdir::{DirEntry, WalkDir};

/// Searches every regular file of a working copy in-process.
#[derive(Debug, Default, Clone)]
pub struct LiteralBackend;

impl LiteralBackend {
    pub fn new() -> Self {
        Self
    }
}

struct FileMatches {
    path: String,
    matches: Vec<LineMatch>,
    binary: bool,
}

impl Sink for FileMatches {
    type Error = std::io::Error;

    fn matched(&mut self, _searcher: &Searcher, mat: &SinkMatch) -> std::io::Result<bool> {
        let line_number = mat.line_number().unwrap_or(0);
        let line = String::from_utf8_lossy(mat.bytes())
            .trim_end_matches(['\r', '\n'])
            .to_string();

        self.matches.push(LineMatch {
            path: self.path.clone(),
            line_number,
            line,
        });

        Ok(true)
    }

    fn binary_data(
        &mut self,
        _searcher: &Searcher,
        _binary_byte_offset: u64,
    ) -> std::io::Result<bool> {
        // Binary files are dropped entirely, including lines seen before the NUL.
        self.binary = true;
        Ok(false)
    }
}

fn is_git_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_type().is_dir() && entry.file_name() == ".git"
}

impl SearchBackend for LiteralBackend {
    fn search_until(
        &self,
        root: &Path,
        literal: &str,
        cancel: &AtomicBool,
    ) -> Result<Vec<LineMatch>> {
        if !root.is_dir() {
            return Err(Error::Search {
                path: root.to_path_buf(),
                reason: "working copy is not a directory".into(),
            });
        }

        let matcher = RegexMatcherBuilder::new()
            .fixed_strings(true)
            .build(literal)
            .map_err(|e| Error::Search {
                path: root.to_path_buf(),
                reason: format!("invalid literal: {e}"),
            })?;

        let mut searcher = SearcherBuilder::new()
            .line_number(true)
            .binary_detection(BinaryDetection::quit(b'\x00'))
            .build();

        let mut results = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !is_git_dir(e));

        for entry in walker {
            check_cancelled(root, cancel)?;
            match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    let mut sink = FileMatches {
                        path: relative_path(root, entry.path()),
                        matches: Vec::new(),
                        binary: false,
                    };
                    if let Err(e) = searcher.search_path(&matcher, entry.path(), &mut sink) {
                        tracing::warn!("Search error for {:?}: {}", entry.path(), e);
                        continue;
                    }
                    if !sink.binary {
                        results.append(&mut sink.matches);
                    }
                }
                Err(e) => tracing::warn!("Walk error under {:?}: {}", root, e),
            }
        }

        results.sort();
        Ok(results)
    }
}
