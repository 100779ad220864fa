use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::SourceControl;
use crate::core::errors::{Error, Result};
use crate::models::{Branch, Repository};

const PER_PAGE: usize = 100;
const USER_AGENT: &str = concat!("orgrep/", env!("CARGO_PKG_VERSION"));

/// GitHub REST API client authenticated with a personal access token.
pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct User {
    login: String,
}

impl GithubClient {
    pub fn new(api_url: &str, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    async fn get_page<T: DeserializeOwned>(&self, path: &str, page: usize) -> Result<Vec<T>> {
        let response = self
            .http
            .get(format!("{}{}", self.api_url, path))
            .bearer_auth(&self.token)
            .query(&[("per_page", PER_PAGE), ("page", page)])
            .send()
            .await?;
        let response = check_status(path, response).await?;
        Ok(response.json().await?)
    }

    /// Follows numbered pages until one comes back short.
    async fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        for page in 1.. {
            let batch: Vec<T> = self.get_page(path, page).await?;
            let done = batch.len() < PER_PAGE;
            items.extend(batch);
            if done {
                break;
            }
        }
        Ok(items)
    }
}

async fn check_status(path: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify(path, status, &body))
}

fn classify(path: &str, status: StatusCode, body: &str) -> Error {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());

    if status == StatusCode::UNAUTHORIZED {
        Error::Auth(message)
    } else {
        Error::Enumeration {
            scope: path.to_string(),
            reason: format!("{status}: {message}"),
        }
    }
}

/// Inserts the token as URL credentials: `https://<token>@host/...`.
pub fn authenticated_url(clone_url: &str, token: &str) -> String {
    match clone_url.strip_prefix("https://") {
        Some(rest) => format!("https://{token}@{rest}"),
        None => clone_url.to_string(),
    }
}

impl SourceControl for GithubClient {
    async fn current_login(&self) -> Result<String> {
        let response = self
            .http
            .get(format!("{}/user", self.api_url))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let user: User = check_status("/user", response).await?.json().await?;
        Ok(user.login)
    }

    async fn list_repositories(&self, organization: &str) -> Result<Vec<Repository>> {
        self.get_all(&format!("/orgs/{organization}/repos")).await
    }

    async fn list_branches(
        &self,
        organization: &str,
        repository: &Repository,
    ) -> Result<Vec<Branch>> {
        self.get_all(&format!(
            "/repos/{organization}/{}/branches",
            repository.name
        ))
        .await
    }

    fn clone_url(&self, repository: &Repository) -> String {
        authenticated_url(&repository.clone_url, &self.token)
    }
}
