use std::time::Duration;

use async_trait::async_trait;
use critic_core::{
    mask_secret, parse_repository, ChangedFile, CriticError, FileStatus, GitHubConfig,
    PublishedComment,
};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::pipeline::{FileSource, Publisher};
use crate::retry::{retry, RetryPolicy};

const USER_AGENT: &str = "critic";
/// Largest page size the pull request files endpoint honours.
const MAX_PER_PAGE: u32 = 100;

/// One entry of `GET /repos/{owner}/{repo}/pulls/{n}/files`.
#[derive(Debug, Clone, Deserialize)]
struct PrFileEntry {
    filename: String,
    status: FileStatus,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
    raw_url: Option<String>,
}

/// GitHub client for fetching pull request files and posting the review.
///
/// Listing and raw downloads go through `reqwest` with bounded retry; the
/// review comment is posted once through `octocrab`.
///
/// # Examples
///
/// ```no_run
/// use critic_core::GitHubConfig;
/// use critic_review::github::GitHubClient;
///
/// # async fn demo() -> critic_core::Result<()> {
/// let client = GitHubClient::new("ghp_xxxx", "octocat/hello-world", &GitHubConfig::default())?;
/// # Ok(())
/// # }
/// ```
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
    http: reqwest::Client,
    token: String,
    owner: String,
    repo: String,
    api_url: String,
    per_page: u32,
    policy: RetryPolicy,
}

impl GitHubClient {
    /// Create a client for `repository` (`owner/name`).
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::Config`] if the repository identifier is
    /// malformed or a client cannot be built.
    pub fn new(token: &str, repository: &str, config: &GitHubConfig) -> Result<Self, CriticError> {
        let (owner, repo) = parse_repository(repository)?;
        let api_url = config.api_url.trim_end_matches('/').to_string();

        let octocrab = octocrab::Octocrab::builder()
            .base_uri(api_url.as_str())
            .map_err(|e| CriticError::Config(format!("invalid GitHub API URL {api_url}: {e}")))?
            .personal_token(token.to_string())
            .build()
            .map_err(|e| CriticError::Config(format!("failed to create GitHub client: {e}")))?;

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CriticError::Config(format!("failed to create HTTP client: {e}")))?;

        let policy = RetryPolicy {
            max_attempts: config.max_attempts,
            ..RetryPolicy::fetch()
        };

        Ok(Self {
            octocrab,
            http,
            token: token.to_string(),
            owner,
            repo,
            api_url,
            per_page: config.per_page.clamp(1, MAX_PER_PAGE),
            policy,
        })
    }

    /// Replace the retry policy used for listing and downloads.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Repository in `owner/name` form.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// List every file changed by the pull request, following pagination.
    async fn list_files(&self, pr_number: u64) -> Result<Vec<PrFileEntry>, CriticError> {
        let mut entries = Vec::new();
        let mut page = 1u32;

        loop {
            let url = format!(
                "{}/repos/{}/{}/pulls/{pr_number}/files?per_page={}&page={page}",
                self.api_url, self.owner, self.repo, self.per_page
            );
            let label = format!("list files of PR #{pr_number} (page {page})");
            let batch: Vec<PrFileEntry> =
                retry(&self.policy, &label, CriticError::is_retryable, || {
                    self.get_json(&url)
                })
                .await
                .map_err(|failure| match failure.error {
                    CriticError::NotFound(_) => CriticError::NotFound(format!(
                        "pull request #{pr_number} not found in {}",
                        self.full_name()
                    )),
                    other => other,
                })?;

            let count = batch.len();
            entries.extend(batch);
            if count < self.per_page as usize {
                break;
            }
            page += 1;
        }

        Ok(entries)
    }

    /// Download the raw content of one file with retry.
    async fn fetch_content(&self, filename: &str, raw_url: &str) -> Result<String, CriticError> {
        let label = format!("download {filename}");
        retry(&self.policy, &label, CriticError::is_retryable, || {
            self.get_text(raw_url)
        })
        .await
        .map_err(|failure| failure.error)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, CriticError> {
        let response = self.send_get(url, "application/vnd.github+json").await?;
        response
            .json()
            .await
            .map_err(|e| CriticError::Api(format!("unexpected response from {url}: {e}")))
    }

    async fn get_text(&self, url: &str) -> Result<String, CriticError> {
        let response = self.send_get(url, "application/vnd.github.raw").await?;
        response
            .text()
            .await
            .map_err(|e| CriticError::Transient(format!("failed to read {url}: {e}")))
    }

    async fn send_get(&self, url: &str, accept: &str) -> Result<reqwest::Response, CriticError> {
        let response = self
            .http
            .get(url)
            .header("Accept", accept)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| CriticError::Transient(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, url, &body));
        }
        Ok(response)
    }
}

fn classify_status(status: StatusCode, url: &str, body: &str) -> CriticError {
    let detail = format!("GitHub API error {status} for {url}: {body}");
    match status {
        StatusCode::NOT_FOUND => CriticError::NotFound(detail),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CriticError::Auth(detail),
        StatusCode::TOO_MANY_REQUESTS => CriticError::Transient(detail),
        s if s.is_server_error() => CriticError::Transient(detail),
        _ => CriticError::Api(detail),
    }
}

#[async_trait]
impl FileSource for GitHubClient {
    async fn fetch_files(&self, pr_number: u64) -> Result<Vec<ChangedFile>, CriticError> {
        tracing::info!(repo = %self.full_name(), "fetching files for PR #{pr_number}");
        tracing::debug!(token = %mask_secret(&self.token), "using GitHub token");

        let entries = self.list_files(pr_number).await.inspect_err(|e| {
            tracing::error!(
                repo = %self.full_name(),
                pr = pr_number,
                "failed to list pull request files: {e}"
            );
        })?;

        let mut files = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.status == FileStatus::Removed {
                tracing::debug!(file = %entry.filename, "skipping removed file");
                continue;
            }
            let Some(raw_url) = entry.raw_url.as_deref() else {
                tracing::warn!(file = %entry.filename, "no raw URL reported, skipping");
                continue;
            };
            let fetched = self.fetch_content(&entry.filename, raw_url).await;
            match fetched {
                Ok(content) => files.push(ChangedFile {
                    filename: entry.filename,
                    content,
                    status: entry.status,
                    additions: entry.additions,
                    deletions: entry.deletions,
                }),
                Err(e) => {
                    tracing::error!(file = %entry.filename, "error fetching file: {e}");
                }
            }
        }

        tracing::info!("fetched {} file(s) from PR #{pr_number}", files.len());
        Ok(files)
    }
}

#[async_trait]
impl Publisher for GitHubClient {
    async fn publish(&self, pr_number: u64, body: &str) -> Result<PublishedComment, CriticError> {
        let route = format!(
            "/repos/{}/{}/issues/{pr_number}/comments",
            self.owner, self.repo
        );
        let payload = serde_json::json!({ "body": body });

        let response: serde_json::Value = self
            .octocrab
            .post(route, Some(&payload))
            .await
            .map_err(|e| CriticError::Publish(format!("failed to post review comment: {e}")))?;

        let comment_id = match response.get("id") {
            Some(serde_json::Value::String(id)) => id.clone(),
            Some(serde_json::Value::Number(id)) => id.to_string(),
            _ => {
                return Err(CriticError::Publish(format!(
                    "comment response has no id: {response}"
                )))
            }
        };
        let url = response
            .get("html_url")
            .and_then(|u| u.as_str())
            .unwrap_or_default()
            .to_string();

        tracing::info!(comment_id = %comment_id, "posted review comment on PR #{pr_number}");
        Ok(PublishedComment { comment_id, url })
    }
}
