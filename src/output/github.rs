//! GitHub pull request reviews.
//!
//! [`GithubRenderer`] prints the review payloads that would be submitted,
//! for inspection or piping. [`GithubClient`] talks to the REST API: it
//! fetches a pull request's changed files and head commit and submits
//! batches as reviews with `event: COMMENT`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GithubConfig;
use crate::constants::{APP_NAME, NO_ISSUES_NOTE, VERSION};
use crate::models::{AnchoredComment, Batch, FilePatch};
use crate::orchestrator::{ReviewOutcome, ReviewReport};
use crate::output::OutputRenderer;
use crate::publish::ReviewSubmitter;

/// Files per page when listing pull request files (the API maximum).
const FILES_PER_PAGE: usize = 100;

/// The files endpoint stops at 3000 files.
const MAX_FILE_PAGES: usize = 30;

const API_VERSION: &str = "2022-11-28";

/// Errors from GitHub API calls.
#[derive(Error, Debug)]
pub enum GithubError {
    #[error("missing GitHub setting: {0}")]
    MissingSetting(String),

    #[error("invalid repository '{0}', expected owner/repo")]
    InvalidRepository(String),

    #[error("API request failed: {0}")]
    ApiError(String),
}

/// Body of `POST /repos/{owner}/{repo}/pulls/{n}/reviews`.
#[derive(Debug, Serialize)]
pub struct ReviewPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<&'a str>,
    pub body: &'a str,
    pub event: &'static str,
    pub comments: &'a [AnchoredComment],
}

impl<'a> ReviewPayload<'a> {
    pub fn new(batch: &'a Batch, commit_id: Option<&'a str>) -> Self {
        Self {
            commit_id,
            body: &batch.title,
            event: "COMMENT",
            comments: &batch.comments,
        }
    }
}

/// GitHub review payload renderer.
pub struct GithubRenderer;

impl OutputRenderer for GithubRenderer {
    fn render(&self, report: &ReviewReport) -> String {
        let output = match &report.outcome {
            ReviewOutcome::NoIssues => serde_json::json!({
                "reviews": [],
                "issue_comments": [{ "body": NO_ISSUES_NOTE }],
            }),
            ReviewOutcome::Review { batches } => {
                let reviews: Vec<ReviewPayload<'_>> =
                    batches.iter().map(|b| ReviewPayload::new(b, None)).collect();
                serde_json::json!({
                    "reviews": reviews,
                    "issue_comments": [],
                })
            }
        };
        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }
}

/// One entry of `GET /repos/{owner}/{repo}/pulls/{n}/files`.
#[derive(Debug, Deserialize)]
struct PullFile {
    filename: String,
    status: String,
    #[serde(default)]
    previous_filename: Option<String>,
    /// Absent for binary files and very large diffs.
    #[serde(default)]
    patch: Option<String>,
}

impl From<PullFile> for FilePatch {
    fn from(f: PullFile) -> Self {
        FilePatch {
            old_path: f.previous_filename.unwrap_or_else(|| f.filename.clone()),
            is_new: f.status == "added",
            is_deleted: f.status == "removed",
            is_rename: f.status == "renamed",
            is_binary: false,
            patch: f.patch.unwrap_or_default(),
            path: f.filename,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PullHead {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    head: PullHead,
}

/// REST client bound to one pull request.
pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
    repository: String,
    token: String,
    pull_number: u64,
}

impl GithubClient {
    pub fn new(config: &GithubConfig, pull_number: u64) -> Result<Self, GithubError> {
        let repository = config
            .repository
            .clone()
            .ok_or_else(|| GithubError::MissingSetting("repository (GITHUB_REPOSITORY)".into()))?;
        validate_repository(&repository)?;
        let token = config
            .token
            .clone()
            .ok_or_else(|| GithubError::MissingSetting("token (GITHUB_TOKEN)".into()))?;

        Ok(Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            repository,
            token,
            pull_number,
        })
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/repos/{}/{suffix}", self.api_url, self.repository)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", format!("{APP_NAME}/{VERSION}"))
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    /// Send a request and fail on non-success status.
    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<reqwest::Response, GithubError> {
        let response = builder
            .send()
            .await
            .map_err(|e| GithubError::ApiError(format!("{what}: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(GithubError::ApiError(format!(
                "{what} failed with HTTP {status}: {body}"
            )));
        }
        Ok(response)
    }

    /// SHA of the pull request's head commit.
    pub async fn pull_head_sha(&self) -> Result<String, GithubError> {
        let url = self.url(&format!("pulls/{}", self.pull_number));
        let response = self
            .send(self.request(reqwest::Method::GET, &url), "fetching pull request")
            .await?;
        let pr: PullRequest = response
            .json()
            .await
            .map_err(|e| GithubError::ApiError(format!("decoding pull request: {e}")))?;
        Ok(pr.head.sha)
    }

    /// Changed files of the pull request, in API order.
    pub async fn list_pull_files(&self) -> Result<Vec<FilePatch>, GithubError> {
        let mut files = Vec::new();
        for page in 1..=MAX_FILE_PAGES {
            let url = self.url(&format!(
                "pulls/{}/files?per_page={FILES_PER_PAGE}&page={page}",
                self.pull_number
            ));
            let response = self
                .send(self.request(reqwest::Method::GET, &url), "listing pull request files")
                .await?;
            let batch: Vec<PullFile> = response
                .json()
                .await
                .map_err(|e| GithubError::ApiError(format!("decoding pull request files: {e}")))?;
            let last = batch.len() < FILES_PER_PAGE;
            files.extend(batch.into_iter().map(FilePatch::from));
            if last {
                break;
            }
        }
        tracing::debug!(count = files.len(), pull = self.pull_number, "fetched pull request files");
        Ok(files)
    }
}

#[async_trait]
impl ReviewSubmitter for GithubClient {
    async fn create_review(&self, batch: &Batch, commit_sha: &str) -> Result<(), GithubError> {
        let url = self.url(&format!("pulls/{}/reviews", self.pull_number));
        let payload = ReviewPayload::new(batch, Some(commit_sha));
        self.send(
            self.request(reqwest::Method::POST, &url).json(&payload),
            "review creation",
        )
        .await?;
        Ok(())
    }

    async fn create_issue_comment(&self, body: &str) -> Result<(), GithubError> {
        let url = self.url(&format!("issues/{}/comments", self.pull_number));
        self.send(
            self.request(reqwest::Method::POST, &url)
                .json(&serde_json::json!({ "body": body })),
            "comment creation",
        )
        .await?;
        Ok(())
    }
}

fn validate_repository(repository: &str) -> Result<(), GithubError> {
    match repository.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok(())
        }
        _ => Err(GithubError::InvalidRepository(repository.to_string())),
    }
}
