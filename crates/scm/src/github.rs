//! GitHub REST API client.
//!
//! Endpoints used:
//! - `GET  /repos/{owner}/{repo}/pulls/{number}/files` (paginated, `patch` is a unified diff)
//! - `GET  /repos/{owner}/{repo}/contents/{path}?ref=...`
//! - `POST /repos/{owner}/{repo}/issues/{number}/comments`

use async_trait::async_trait;
use base64::Engine;
use prbot_core::change::{ChangeDescriptor, ChangeKind};
use prbot_core::error::ScmError;
use prbot_core::scm::{ChangeQuery, ChangeSource, CommentSink, ContentFetcher};
use serde::Deserialize;
use tracing::{debug, info};

const DEFAULT_API_URL: &str = "https://api.github.com";
const PER_PAGE: usize = 100;
const USER_AGENT: &str = concat!("prbot/", env!("CARGO_PKG_VERSION"));

/// GitHub REST client bound to one repository.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    owner: String,
    repo: String,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl GitHubClient {
    pub fn new(
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Result<Self, ScmError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| ScmError::Network(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_url: DEFAULT_API_URL.into(),
            token: token.into(),
            owner: owner.into(),
            repo: repo.into(),
        })
    }

    /// Point at a GitHub Enterprise instance or a test server.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    /// A comment sink for one pull request of this repository.
    pub fn comments_for(&self, pr_number: u64) -> PullRequestComments {
        PullRequestComments {
            client: self.clone(),
            pr_number,
        }
    }

    fn repo_url(&self, tail: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.api_url, self.owner, self.repo, tail)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, ScmError> {
        self.authorized(builder)
            .send()
            .await
            .map_err(|e| ScmError::Network(e.to_string()))
    }

    /// Turn a non-success status into `ScmError::Api`.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ScmError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(ScmError::Api {
            status_code: status.as_u16(),
            message,
        })
    }

    async fn list_files_page(&self, pr_number: u64, page: usize) -> Result<Vec<PullFile>, ScmError> {
        let url = self.repo_url(&format!("pulls/{pr_number}/files"));
        let response = self
            .send(
                self.http
                    .get(&url)
                    .query(&[("page", page.to_string()), ("per_page", PER_PAGE.to_string())]),
            )
            .await?;
        let response = Self::ensure_success(response).await?;
        response
            .json()
            .await
            .map_err(|e| ScmError::Decode(format!("pull request files: {e}")))
    }
}

#[async_trait]
impl ChangeSource for GitHubClient {
    fn label(&self) -> &str {
        "github-api"
    }

    async fn list_changes(&self, query: &ChangeQuery) -> Result<Vec<ChangeDescriptor>, ScmError> {
        let mut changes = Vec::new();
        let mut page = 1;

        loop {
            let files = self.list_files_page(query.pr_number, page).await?;
            let count = files.len();
            debug!(page, count, "Fetched pull request files page");
            changes.extend(files.into_iter().map(PullFile::into_descriptor));

            if count < PER_PAGE {
                break;
            }
            page += 1;
        }

        info!(pr = query.pr_number, files = changes.len(), "Listed changes via GitHub API");
        Ok(changes)
    }
}

#[async_trait]
impl ContentFetcher for GitHubClient {
    async fn fetch_content(&self, path: &str, git_ref: &str) -> Result<String, ScmError> {
        let url = self.repo_url(&format!("contents/{}", encode_path(path)));
        let response = self.send(self.http.get(&url).query(&[("ref", git_ref)])).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(path, git_ref, "File not found at ref");
            return Ok(String::new());
        }

        let response = Self::ensure_success(response).await?;
        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ScmError::Decode(format!("contents of {path}: {e}")))?;

        decode_contents(&payload)
    }
}

/// Decode a contents API payload. Directory listings (arrays) yield empty text.
fn decode_contents(payload: &serde_json::Value) -> Result<String, ScmError> {
    let Some(content) = payload.get("content").and_then(|c| c.as_str()) else {
        return Ok(String::new());
    };

    if payload.get("encoding").and_then(|e| e.as_str()) == Some("base64") {
        let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(cleaned)
            .map_err(|e| ScmError::Decode(format!("base64: {e}")))?;
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }

    Ok(content.to_string())
}

/// Posts comments on a single pull request.
#[derive(Debug, Clone)]
pub struct PullRequestComments {
    client: GitHubClient,
    pr_number: u64,
}

#[async_trait]
impl CommentSink for PullRequestComments {
    async fn post_comment(&self, body: &str) -> Result<(), ScmError> {
        let url = self.client.repo_url(&format!("issues/{}/comments", self.pr_number));
        let response = self
            .client
            .send(self.client.http.post(&url).json(&serde_json::json!({ "body": body })))
            .await?;
        GitHubClient::ensure_success(response).await?;
        info!(pr = self.pr_number, chars = body.len(), "Posted review comment");
        Ok(())
    }
}

// --- GitHub API types ---

#[derive(Debug, Deserialize)]
struct PullFile {
    filename: String,
    status: String,
    #[serde(default)]
    additions: u32,
    #[serde(default)]
    deletions: u32,
    #[serde(default)]
    patch: Option<String>,
}

impl PullFile {
    fn into_descriptor(self) -> ChangeDescriptor {
        let descriptor = ChangeDescriptor::new(self.filename, ChangeKind::from_api_status(&self.status))
            .with_stats(self.additions, self.deletions);
        match self.patch {
            Some(patch) => descriptor.with_patch(patch),
            None => descriptor,
        }
    }
}

/// Percent-encode each segment of a repository path for use in a URL.
fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            segment.bytes().fold(String::with_capacity(segment.len()), |mut out, b| {
                if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
                    out.push(char::from(b));
                } else {
                    out.push_str(&format!("%{b:02X}"));
                }
                out
            })
        })
        .collect::<Vec<_>>()
        .join("/")
}
