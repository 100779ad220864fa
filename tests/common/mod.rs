#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use orgrep::core::config::RunConfig;
use orgrep::core::errors::{Error, Result};
use orgrep::models::{Branch, Repository};
use orgrep::services::search::EngineKind;
use orgrep::services::source::SourceControl;
use tempfile::TempDir;

pub fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["-c", "user.name=orgrep", "-c", "user.email=orgrep@example.com"])
        .args(args)
        .status()
        .expect("git should be installed");
    assert!(status.success(), "git {args:?} failed in {}", dir.display());
}

/// A local repository whose branches each hold their own set of files.
pub struct RepoFixture {
    pub path: PathBuf,
    base: String,
}

impl RepoFixture {
    /// Initializes `root/name` with an empty root commit every branch starts from.
    pub fn init(root: &Path, name: &str) -> Self {
        let path = root.join(name);
        fs::create_dir_all(&path).unwrap();
        git(&path, &["init", "-q"]);
        git(&path, &["commit", "-q", "--allow-empty", "-m", "root"]);
        let base = current_head(&path);
        Self { path, base }
    }

    /// Commits `files` as the only content of `branch`.
    pub fn branch(self, branch: &str, files: &[(&str, &str)]) -> Self {
        git(&self.path, &["checkout", "-q", "-B", branch, &self.base]);
        for (file, contents) in files {
            let target = self.path.join(file);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&target, contents).unwrap();
        }
        git(&self.path, &["add", "-A"]);
        git(&self.path, &["commit", "-q", "--allow-empty", "-m", branch]);
        // Park HEAD away from every branch under test.
        git(&self.path, &["checkout", "-q", "--detach", &self.base]);
        self
    }

    pub fn url(&self) -> String {
        format!("file://{}", self.path.display())
    }

    pub fn repository(&self, name: &str) -> Repository {
        Repository::new(name, self.url())
    }
}

fn current_head(path: &Path) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(path)
        .args(["rev-parse", "HEAD"])
        .output()
        .unwrap();
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

/// Lines `1..=count`, with `needle` placed on line `at`.
pub fn lines_with(needle: &str, at: usize, count: usize) -> String {
    (1..=count)
        .map(|n| {
            if n == at {
                format!("secret: {needle}\n")
            } else {
                format!("line {n}\n")
            }
        })
        .collect()
}

/// In-memory source-control service.
#[derive(Default)]
pub struct FakeSource {
    pub login: Option<String>,
    pub repositories: Vec<Repository>,
    pub branches: HashMap<String, Vec<Branch>>,
    pub auth_rejected: bool,
    pub listing_broken: bool,
}

impl FakeSource {
    pub fn with_repo(mut self, repository: Repository, branches: &[&str]) -> Self {
        self.branches.insert(
            repository.name.clone(),
            branches.iter().map(|b| Branch::new(*b)).collect(),
        );
        self.repositories.push(repository);
        self
    }

    /// A repository whose branch listing fails.
    pub fn with_unlistable_repo(mut self, repository: Repository) -> Self {
        self.repositories.push(repository);
        self
    }
}

impl SourceControl for FakeSource {
    async fn current_login(&self) -> Result<String> {
        self.login
            .clone()
            .ok_or_else(|| Error::Other("identity lookup failed".into()))
    }

    async fn list_repositories(&self, organization: &str) -> Result<Vec<Repository>> {
        if self.auth_rejected {
            return Err(Error::Auth("Bad credentials".into()));
        }
        if self.listing_broken {
            return Err(Error::Enumeration {
                scope: format!("repositories of {organization}"),
                reason: "502 Bad Gateway".into(),
            });
        }
        Ok(self.repositories.clone())
    }

    async fn list_branches(
        &self,
        organization: &str,
        repository: &Repository,
    ) -> Result<Vec<Branch>> {
        self.branches
            .get(&repository.name)
            .cloned()
            .ok_or_else(|| Error::Enumeration {
                scope: format!("branches of {organization}/{}", repository.name),
                reason: "404 Not Found".into(),
            })
    }

    fn clone_url(&self, repository: &Repository) -> String {
        repository.clone_url.clone()
    }
}

pub fn config(pattern: &str, output_dir: &TempDir) -> Arc<RunConfig> {
    Arc::new(RunConfig {
        organization: "acme".into(),
        pattern: pattern.into(),
        token: "ghp_test".into(),
        repo_workers: 4,
        branch_workers: 3,
        engine: EngineKind::Native,
        host: "github.com".into(),
        api_url: "https://api.github.com".into(),
        output_path: output_dir.path().join("Data_collected.xlsx"),
        clone_timeout: Duration::from_secs(60),
        search_timeout: Duration::from_secs(60),
        clone_retries: 0,
    })
}
