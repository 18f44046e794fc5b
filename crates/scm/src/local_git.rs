//! Change listing from the local checkout using `git diff`.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use prbot_core::change::{ChangeDescriptor, ChangeKind};
use prbot_core::error::ScmError;
use prbot_core::scm::{ChangeQuery, ChangeSource};
use tokio::process::Command;
use tracing::{debug, info, warn};

const NAME_STATUS_TIMEOUT: Duration = Duration::from_secs(30);
const PER_FILE_TIMEOUT: Duration = Duration::from_secs(10);

/// Lists changes by diffing `base...head` in a local repository.
///
/// Requires both refs to be present locally (CI checkouts usually need a
/// full fetch for this). Any failure of the name-status listing is an error,
/// so a [`crate::ChangeSourceChain`] can fall through to the API.
#[derive(Debug, Clone)]
pub struct LocalGitChanges {
    repo_path: PathBuf,
}

impl LocalGitChanges {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    async fn git(&self, args: &[&str], timeout: Duration) -> Result<String, ScmError> {
        debug!(?args, "Running git");
        let output = tokio::time::timeout(
            timeout,
            Command::new("git")
                .args(args)
                .current_dir(&self.repo_path)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| ScmError::Git(format!("git {} timed out", args.join(" "))))?
        .map_err(|e| ScmError::Git(format!("failed to spawn git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScmError::Git(stderr.trim().to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn describe(&self, range: &str, kind: ChangeKind, path: String) -> ChangeDescriptor {
        let (additions, deletions) = match self
            .git(&["diff", "--numstat", range, "--", &path], PER_FILE_TIMEOUT)
            .await
        {
            Ok(out) => parse_numstat(&out),
            Err(e) => {
                warn!(path = %path, error = %e, "numstat failed, counting zero lines");
                (0, 0)
            }
        };

        let patch = self
            .git(&["diff", range, "--", &path], PER_FILE_TIMEOUT)
            .await
            .unwrap_or_default();

        ChangeDescriptor::new(path, kind)
            .with_stats(additions, deletions)
            .with_patch(patch)
    }
}

#[async_trait]
impl ChangeSource for LocalGitChanges {
    fn label(&self) -> &str {
        "local-git"
    }

    async fn list_changes(&self, query: &ChangeQuery) -> Result<Vec<ChangeDescriptor>, ScmError> {
        let range = format!("{}...{}", query.base_ref, query.head_ref);
        let listing = self
            .git(&["diff", "--name-status", &range], NAME_STATUS_TIMEOUT)
            .await?;

        let mut changes = Vec::new();
        for (kind, path) in listing.lines().filter_map(parse_name_status) {
            changes.push(self.describe(&range, kind, path).await);
        }

        info!(range = %range, files = changes.len(), "Listed changes via local git");
        Ok(changes)
    }
}

/// One `--name-status` line: `M\tpath` or `R100\told\tnew`.
fn parse_name_status(line: &str) -> Option<(ChangeKind, String)> {
    let mut parts = line.split('\t');
    let status = parts.next()?.trim();
    if status.is_empty() {
        return None;
    }
    let first = parts.next()?;
    let path = parts.next().unwrap_or(first);
    Some((ChangeKind::from_git_status(status), path.to_string()))
}

/// `--numstat` prints `-` for binary files.
fn parse_numstat(output: &str) -> (u32, u32) {
    let Some(line) = output.lines().next() else {
        return (0, 0);
    };
    let mut parts = line.split('\t');
    let count = |field: Option<&str>| field.and_then(|f| f.parse().ok()).unwrap_or(0);
    (count(parts.next()), count(parts.next()))
}
