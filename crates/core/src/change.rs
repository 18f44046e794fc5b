//! Change-set and review-context domain types.
//!
//! A review run is built around one immutable [`ReviewContext`]: the pull
//! request's identifiers and metadata plus the ordered list of
//! [`ChangeDescriptor`]s, regardless of whether they came from a local
//! `git diff` or the hosting API.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How a file was changed by the pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
    Renamed,
    Copied,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Removed => "removed",
            Self::Renamed => "renamed",
            Self::Copied => "copied",
        }
    }

    /// Map a hosting-API file status. Unknown statuses (including GitHub's
    /// `changed` and `unchanged`) count as modified.
    pub fn from_api_status(status: &str) -> Self {
        match status {
            "added" => Self::Added,
            "removed" => Self::Removed,
            "renamed" => Self::Renamed,
            "copied" => Self::Copied,
            _ => Self::Modified,
        }
    }

    /// Map the status letter of `git diff --name-status` (`R100` → `R`).
    pub fn from_git_status(code: &str) -> Self {
        match code.chars().next() {
            Some('A') => Self::Added,
            Some('D') => Self::Removed,
            Some('R') => Self::Renamed,
            Some('C') => Self::Copied,
            _ => Self::Modified,
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file's modification in a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDescriptor {
    /// Path relative to the repository root (destination path for renames)
    pub path: String,

    pub kind: ChangeKind,

    pub additions: u32,

    pub deletions: u32,

    /// Unified diff text; absent for binary or oversized files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

impl ChangeDescriptor {
    pub fn new(path: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            additions: 0,
            deletions: 0,
            patch: None,
        }
    }

    pub fn with_stats(mut self, additions: u32, deletions: u32) -> Self {
        self.additions = additions;
        self.deletions = deletions;
        self
    }

    pub fn with_patch(mut self, patch: impl Into<String>) -> Self {
        self.patch = Some(patch.into());
        self
    }

    /// The patch, treating an empty string the same as no patch.
    pub fn patch_text(&self) -> Option<&str> {
        self.patch.as_deref().filter(|p| !p.is_empty())
    }
}

/// Everything the reviewer knows about the pull request under review.
///
/// Built once at the start of a run and shared read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewContext {
    pub owner: String,
    pub repo: String,
    pub pr_number: u64,
    pub head_ref: String,
    pub head_sha: String,
    pub base_ref: String,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub changes: Vec<ChangeDescriptor>,
    /// Root of the local repository checkout
    pub checkout: PathBuf,
}

impl ReviewContext {
    /// The first eight characters of the head commit.
    pub fn short_sha(&self) -> &str {
        match self.head_sha.char_indices().nth(8) {
            Some((idx, _)) => &self.head_sha[..idx],
            None => &self.head_sha,
        }
    }

    /// The PR description, or `None` when it is missing or blank.
    pub fn description(&self) -> Option<&str> {
        self.body.as_deref().filter(|b| !b.trim().is_empty())
    }

    pub fn find_change(&self, path: &str) -> Option<&ChangeDescriptor> {
        self.changes.iter().find(|c| c.path == path)
    }
}
