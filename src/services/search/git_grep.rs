use super::backend::{check_cancelled, SearchBackend};
use super::LineMatch;
use crate::core::errors::{Error, Result};
use std::path::Path;
use std::process::{Command, Output};
use std::sync::atomic::AtomicBool;

/// Two-stage `git grep`: list matching files, then collect lines per file.
#[derive(Debug, Default, Clone)]
pub struct GitGrepBackend;

impl GitGrepBackend {
    pub fn new() -> Self {
        Self
    }

    fn git_grep(root: &Path, args: &[&str]) -> Result<Option<Vec<u8>>> {
        let output = Command::new("git")
            .arg("-C")
            .arg(root)
            // File names from the first pass are passed back verbatim, never as globs.
            .arg("--literal-pathspecs")
            .args(["-c", "core.quotePath=false", "grep", "--no-color", "-I", "-F", "-z"])
            .args(args)
            .output()
            .map_err(|e| Error::Search {
                path: root.to_path_buf(),
                reason: format!("failed to run git: {e}"),
            })?;
        interpret(root, output)
    }

    fn matching_files(root: &Path, literal: &str) -> Result<Vec<String>> {
        let Some(stdout) = Self::git_grep(root, &["-l", "-e", literal])? else {
            return Ok(Vec::new());
        };
        Ok(stdout
            .split(|b| *b == 0 || *b == b'\n')
            .filter(|chunk| !chunk.is_empty())
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect())
    }

    fn matching_lines(root: &Path, literal: &str, file: &str) -> Result<Vec<LineMatch>> {
        let Some(stdout) = Self::git_grep(root, &["-n", "-h", "-e", literal, "--", file])? else {
            return Ok(Vec::new());
        };
        let text = String::from_utf8_lossy(&stdout);
        let mut lines = Vec::new();
        for record in text.lines() {
            // With -z the line number is followed by NUL instead of ':'.
            let Some((number, content)) = record.split_once('\0') else {
                continue;
            };
            match number.parse::<u64>() {
                Ok(line_number) => lines.push(LineMatch {
                    path: file.to_string(),
                    line_number,
                    line: content.trim_end_matches('\r').to_string(),
                }),
                Err(_) => tracing::debug!("Unparseable git grep record in {}: {:?}", file, record),
            }
        }
        Ok(lines)
    }
}

/// Exit status 1 means "no match"; anything else non-zero is a failure.
fn interpret(root: &Path, output: Output) -> Result<Option<Vec<u8>>> {
    match output.status.code() {
        Some(0) => Ok(Some(output.stdout)),
        Some(1) => Ok(None),
        _ => Err(Error::Search {
            path: root.to_path_buf(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }),
    }
}

impl SearchBackend for GitGrepBackend {
    fn search_until(
        &self,
        root: &Path,
        literal: &str,
        cancel: &AtomicBool,
    ) -> Result<Vec<LineMatch>> {
        let mut results = Vec::new();
        for file in Self::matching_files(root, literal)? {
            check_cancelled(root, cancel)?;
            match Self::matching_lines(root, literal, &file) {
                Ok(mut lines) => results.append(&mut lines),
                Err(e) => tracing::warn!("Skipping {}: {}", file, e),
            }
        }
        results.sort();
        Ok(results)
    }
}
