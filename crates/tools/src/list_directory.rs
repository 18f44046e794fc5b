//! `list_directory`: immediate entries of a checkout directory.

use prbot_core::error::ToolError;
use prbot_core::provider::ToolDefinition;

use crate::checkout::Checkout;

pub const NAME: &str = "list_directory";

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.into(),
        description: "List the files and directories at a path. Useful for exploring the \
                      repository structure."
            .into(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory path relative to the repository root (empty string for the root)",
                    "default": ""
                }
            }
        }),
    }
}

pub async fn run(checkout: &Checkout, path: &str) -> Result<String, ToolError> {
    let dir = checkout.resolve(path)?;
    let shown = if path.is_empty() { "root" } else { path };

    let Ok(meta) = tokio::fs::metadata(&dir).await else {
        return Ok(format!("Directory '{path}' does not exist."));
    };
    if !meta.is_dir() {
        return Ok(format!("'{path}' is not a directory."));
    }

    let failed = |e: std::io::Error| ToolError::ExecutionFailed {
        tool_name: NAME.into(),
        reason: format!("'{path}': {e}"),
    };

    let mut names = Vec::new();
    let mut reader = tokio::fs::read_dir(&dir).await.map_err(failed)?;
    while let Some(entry) = reader.next_entry().await.map_err(failed)? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();

    if names.is_empty() {
        return Ok(format!("Directory '{shown}' is empty."));
    }

    let mut lines = Vec::with_capacity(names.len());
    for name in names {
        // Follows symlinks; a dangling link shows as a zero-byte file
        match tokio::fs::metadata(dir.join(&name)).await {
            Ok(m) if m.is_dir() => lines.push(format!("[DIR]  {name}/")),
            Ok(m) => lines.push(format!("[FILE] {name} ({} bytes)", m.len())),
            Err(_) => lines.push(format!("[FILE] {name} (0 bytes)")),
        }
    }

    Ok(format!("=== Contents of '{shown}' ===\n\n{}", lines.join("\n")))
}
