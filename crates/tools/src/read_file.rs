//! `read_file`: file text from the checkout, falling back to the remote.

use prbot_core::error::ToolError;
use prbot_core::provider::ToolDefinition;
use prbot_core::scm::ContentFetcher;
use tracing::debug;

use crate::bounds::{READ_FILE_LIMIT, clip};
use crate::checkout::Checkout;

pub const NAME: &str = "read_file";

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.into(),
        description: "Read the full contents of any file in the repository, not only the \
                      files changed by this pull request. Use it to examine code in detail, \
                      understand surrounding context and check dependencies."
            .into(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path relative to the repository root (e.g. 'src/main.rs', 'README.md')"
                }
            },
            "required": ["file_path"]
        }),
    }
}

pub async fn run(
    checkout: &Checkout,
    remote: Option<&dyn ContentFetcher>,
    head_sha: &str,
    file_path: &str,
) -> Result<String, ToolError> {
    let local = checkout.resolve(file_path)?;

    let content = if tokio::fs::metadata(&local).await.is_ok_and(|m| m.is_file()) {
        let bytes = tokio::fs::read(&local).await.map_err(|e| ToolError::ExecutionFailed {
            tool_name: NAME.into(),
            reason: format!("'{file_path}': {e}"),
        })?;
        String::from_utf8_lossy(&bytes).into_owned()
    } else if let Some(remote) = remote {
        debug!(path = file_path, git_ref = head_sha, "Not in checkout, fetching remotely");
        remote
            .fetch_content(file_path, head_sha)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: NAME.into(),
                reason: format!("'{file_path}': {e}"),
            })?
    } else {
        String::new()
    };

    if content.is_empty() {
        return Ok(format!("File '{file_path}' not found or is empty."));
    }

    let body = match clip(&content, READ_FILE_LIMIT) {
        Some(head) => format!(
            "{head}\n\n[... truncated, file is {} chars total]",
            content.chars().count()
        ),
        None => content,
    };

    Ok(format!("=== Content of {file_path} ===\n\n{body}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use prbot_core::error::ScmError;

    struct Remote(&'static str);

    #[async_trait]
    impl ContentFetcher for Remote {
        async fn fetch_content(&self, path: &str, _git_ref: &str) -> Result<String, ScmError> {
            Ok(if path == "remote_only.rs" { self.0.to_string() } else { String::new() })
        }
    }

    #[tokio::test]
    async fn reads_local_file_with_header() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.rs"), "fn main() {}\n").unwrap();

        let out = run(&Checkout::new(dir.path()), None, "abc", "main.rs").await.unwrap();
        assert_eq!(out, "=== Content of main.rs ===\n\nfn main() {}\n");
    }

    #[tokio::test]
    async fn missing_file_is_explanatory_text() {
        let dir = tempfile::tempdir().unwrap();
        let out = run(&Checkout::new(dir.path()), Some(&Remote("x")), "abc", "nope.rs")
            .await
            .unwrap();
        assert_eq!(out, "File 'nope.rs' not found or is empty.");
    }

    #[tokio::test]
    async fn falls_back_to_remote() {
        let dir = tempfile::tempdir().unwrap();
        let out = run(
            &Checkout::new(dir.path()),
            Some(&Remote("pub fn remote() {}")),
            "abc",
            "remote_only.rs",
        )
        .await
        .unwrap();
        assert!(out.contains("pub fn remote() {}"));
    }

    #[tokio::test]
    async fn large_file_is_truncated_with_length() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("big.log"), "x".repeat(READ_FILE_LIMIT + 10)).unwrap();

        let out = run(&Checkout::new(dir.path()), None, "abc", "big.log").await.unwrap();
        assert!(out.ends_with("[... truncated, file is 50010 chars total]"));
        assert_eq!(out.matches('x').count(), READ_FILE_LIMIT);
    }

    #[tokio::test]
    async fn directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        let out = run(&Checkout::new(dir.path()), None, "abc", "src").await.unwrap();
        assert_eq!(out, "File 'src' not found or is empty.");
    }
}
