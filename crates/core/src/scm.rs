//! Source-control collaborator traits.
//!
//! Implementations (GitHub REST API, local `git`) live in `prbot-scm`.

use async_trait::async_trait;

use crate::change::ChangeDescriptor;
use crate::error::ScmError;

/// Identifies the change set to list.
///
/// Local sources diff `base_ref...head_ref`; API sources look the pull
/// request up by number. Both fields are always filled so any source in a
/// chain can answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeQuery {
    pub base_ref: String,
    pub head_ref: String,
    pub pr_number: u64,
}

/// Produces the ordered list of changed files for a pull request.
///
/// An empty list is a valid answer meaning "nothing to review".
#[async_trait]
pub trait ChangeSource: Send + Sync {
    /// Short label used in logs (e.g. "local-git", "github-api").
    fn label(&self) -> &str;

    async fn list_changes(&self, query: &ChangeQuery) -> Result<Vec<ChangeDescriptor>, ScmError>;
}

/// Fetches a file's full text at a given ref.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Returns an empty string when the file does not exist at `git_ref`.
    async fn fetch_content(&self, path: &str, git_ref: &str) -> Result<String, ScmError>;
}

/// Posts a single textual comment on the pull request under review.
#[async_trait]
pub trait CommentSink: Send + Sync {
    async fn post_comment(&self, body: &str) -> Result<(), ScmError>;
}
