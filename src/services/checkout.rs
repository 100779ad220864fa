//! Shallow, single-branch clones into a caller-owned directory.

use std::future::Future;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use crate::core::errors::{Error, Result};

pub trait Checkout: Send + Sync {
    /// Clones only the tip of `branch` from `url` into the empty directory `dest`.
    fn shallow_clone(
        &self,
        url: &str,
        branch: &str,
        dest: &Path,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Clones with the `git` binary found on `PATH`.
#[derive(Debug, Default, Clone)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }
}

impl Checkout for GitCli {
    async fn shallow_clone(&self, url: &str, branch: &str, dest: &Path) -> Result<()> {
        let output = Command::new("git")
            .args(["clone", "--depth", "1", "--single-branch", "--quiet"])
            .arg("--branch")
            .arg(branch)
            .arg("--")
            .arg(url)
            .arg(dest)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::Clone {
                branch: branch.to_string(),
                reason: format!("failed to run git: {e}"),
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(Error::Clone {
            branch: branch.to_string(),
            reason: redact_credentials(stderr.trim()),
        })
    }
}

/// Masks `user[:password]@` in any URL within `text`.
pub fn redact_credentials(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find("://") {
        let (head, tail) = rest.split_at(idx + 3);
        out.push_str(head);
        let authority_end = tail
            .find(|c: char| c == '/' || c.is_whitespace() || c == '\'' || c == '"')
            .unwrap_or(tail.len());
        match tail[..authority_end].rfind('@') {
            Some(at) => {
                out.push_str("***");
                out.push_str(&tail[at..authority_end]);
            }
            None => out.push_str(&tail[..authority_end]),
        }
        rest = &tail[authority_end..];
    }
    out.push_str(rest);
    out
}
