//! The CI pull-request event payload.
//!
//! Only the handful of fields the reviewer needs are deserialized; the rest
//! of the (large) webhook payload is ignored.

use std::path::{Path, PathBuf};

use prbot_core::change::{ChangeDescriptor, ReviewContext};
use prbot_core::error::ScmError;
use prbot_core::scm::ChangeQuery;
use serde::Deserialize;

/// The `pull_request` object of a pull-request event.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub head: GitRef,
    pub base: GitRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub name: String,
    #[serde(default)]
    pub sha: String,
}

#[derive(Deserialize)]
struct EventEnvelope {
    pull_request: Option<PullRequestEvent>,
}

impl PullRequestEvent {
    /// Read the event file. `Ok(None)` means the run was not triggered by a
    /// pull request and should be skipped.
    pub fn load(path: &Path) -> Result<Option<Self>, ScmError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ScmError::InvalidEvent(format!("{}: {e}", path.display())))?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Option<Self>, ScmError> {
        let envelope: EventEnvelope =
            serde_json::from_str(raw).map_err(|e| ScmError::InvalidEvent(e.to_string()))?;
        Ok(envelope.pull_request)
    }

    pub fn change_query(&self) -> ChangeQuery {
        ChangeQuery {
            base_ref: self.base.name.clone(),
            head_ref: self.head.name.clone(),
            pr_number: self.number,
        }
    }

    pub fn into_context(
        self,
        owner: impl Into<String>,
        repo: impl Into<String>,
        changes: Vec<ChangeDescriptor>,
        checkout: impl Into<PathBuf>,
    ) -> ReviewContext {
        ReviewContext {
            owner: owner.into(),
            repo: repo.into(),
            pr_number: self.number,
            head_ref: self.head.name,
            head_sha: self.head.sha,
            base_ref: self.base.name,
            title: self.title,
            body: self.body,
            changes,
            checkout: checkout.into(),
        }
    }
}
