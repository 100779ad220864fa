//! Run configuration, built once at startup and passed to every component.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;

use crate::core::errors::{Error, Result};
use crate::services::search::EngineKind;

/// Upper bound on concurrently processed repositories, independent of machine size.
pub const MAX_REPO_WORKERS: usize = 15;
/// Concurrent branch clones per repository.
pub const DEFAULT_BRANCH_WORKERS: usize = 3;
pub const DEFAULT_HOST: &str = "github.com";
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Raw `search` arguments as given on the command line or in the environment.
#[derive(Debug, Clone, Default, Args)]
pub struct SearchArgs {
    /// Organization whose repositories are searched.
    #[arg(long = "org", env = "ORG_NAME")]
    pub organization: Option<String>,

    /// Literal text to look for. Never interpreted as a regular expression.
    #[arg(long = "search", env = "SEARCH_STRING")]
    pub pattern: Option<String>,

    /// Access token for the source-control API and clones.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Repositories processed at once (clamped to 1..=15).
    #[arg(long = "workers", env = "MAX_WORKERS")]
    pub workers: Option<usize>,

    /// Branches cloned at once within one repository.
    #[arg(long = "branch-workers", env = "BRANCH_WORKERS")]
    pub branch_workers: Option<usize>,

    #[arg(long, env = "SEARCH_ENGINE", value_enum, default_value_t = EngineKind::Native)]
    pub engine: EngineKind,

    /// Host used in generated links and clone URLs.
    #[arg(long, env = "GITHUB_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    #[arg(long = "api-url", env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Output workbook. Defaults to ./Outputs/Extras/Data_collected.xlsx.
    #[arg(long, env = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Seconds allowed for one shallow clone.
    #[arg(long = "clone-timeout", default_value_t = 300)]
    pub clone_timeout_secs: u64,

    /// Seconds allowed for searching one working copy.
    #[arg(long = "search-timeout", default_value_t = 300)]
    pub search_timeout_secs: u64,

    /// Extra clone attempts before a branch is skipped.
    #[arg(long = "clone-retries", env = "CLONE_RETRIES", default_value_t = 0)]
    pub clone_retries: u32,
}

#[derive(Clone)]
pub struct RunConfig {
    pub organization: String,
    pub pattern: String,
    pub token: String,
    pub repo_workers: usize,
    pub branch_workers: usize,
    pub engine: EngineKind,
    pub host: String,
    pub api_url: String,
    pub output_path: PathBuf,
    pub clone_timeout: Duration,
    pub search_timeout: Duration,
    pub clone_retries: u32,
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("organization", &self.organization)
            .field("pattern", &self.pattern)
            .field("token", &"<redacted>")
            .field("repo_workers", &self.repo_workers)
            .field("branch_workers", &self.branch_workers)
            .field("engine", &self.engine)
            .field("host", &self.host)
            .field("api_url", &self.api_url)
            .field("output_path", &self.output_path)
            .field("clone_timeout", &self.clone_timeout)
            .field("search_timeout", &self.search_timeout)
            .field("clone_retries", &self.clone_retries)
            .finish()
    }
}

impl RunConfig {
    /// Validates raw arguments. `cwd` anchors the default output path.
    pub fn from_args(args: SearchArgs, cwd: &Path) -> Result<Self> {
        let organization = required(args.organization, "ORG_NAME")?;
        let pattern = args
            .pattern
            .filter(|p| !p.is_empty())
            .ok_or_else(|| missing("SEARCH_STRING"))?;
        if pattern.contains(['\n', '\r']) {
            return Err(Error::Config("SEARCH_STRING must be a single line".into()));
        }
        let token = required(args.token, "GITHUB_TOKEN")?;

        let repo_workers = match args.workers {
            Some(0) => return Err(Error::Config("MAX_WORKERS must be at least 1".into())),
            Some(n) => n.min(MAX_REPO_WORKERS),
            None => default_repo_workers(),
        };
        let branch_workers = match args.branch_workers {
            Some(0) => return Err(Error::Config("BRANCH_WORKERS must be at least 1".into())),
            Some(n) => n,
            None => DEFAULT_BRANCH_WORKERS,
        };
        if args.clone_timeout_secs == 0 || args.search_timeout_secs == 0 {
            return Err(Error::Config("timeouts must be at least one second".into()));
        }

        let output_path = args.output.unwrap_or_else(|| default_output_path(cwd));

        Ok(Self {
            organization,
            pattern,
            token,
            repo_workers,
            branch_workers,
            engine: args.engine,
            host: args.host.trim_end_matches('/').to_string(),
            api_url: args.api_url.trim_end_matches('/').to_string(),
            output_path,
            clone_timeout: Duration::from_secs(args.clone_timeout_secs),
            search_timeout: Duration::from_secs(args.search_timeout_secs),
            clone_retries: args.clone_retries,
        })
    }
}

/// `max(1, min(cpus - 1, 15))`: leave one core for the coordinator.
pub fn default_repo_workers() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cpus.saturating_sub(1).clamp(1, MAX_REPO_WORKERS)
}

pub fn default_output_path(cwd: &Path) -> PathBuf {
    cwd.join("Outputs").join("Extras").join("Data_collected.xlsx")
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| missing(name))
}

fn missing(name: &str) -> Error {
    Error::Config(format!("missing required setting {name}"))
}
