//! `get_pr_context`: pull request metadata and a capped change list.

use prbot_core::change::ReviewContext;
use prbot_core::provider::ToolDefinition;

use crate::bounds::PR_CONTEXT_FILE_CAP;

pub const NAME: &str = "get_pr_context";

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.into(),
        description: "Get the pull request's title, description, base and head refs and the \
                      list of changed files with line counts."
            .into(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {}
        }),
    }
}

pub fn render(ctx: &ReviewContext) -> String {
    let mut files: Vec<String> = ctx
        .changes
        .iter()
        .take(PR_CONTEXT_FILE_CAP)
        .map(|c| format!("  - {} ({}, +{}/-{})", c.path, c.kind, c.additions, c.deletions))
        .collect();

    if ctx.changes.len() > PR_CONTEXT_FILE_CAP {
        files.push(format!(
            "  ... and {} more files",
            ctx.changes.len() - PR_CONTEXT_FILE_CAP
        ));
    }

    format!(
        "=== Pull Request Context ===\n\n\
         Title: {title}\n\n\
         Description:\n{description}\n\n\
         Changed Files ({total} total):\n{files}\n\n\
         Base: {base}\n\
         Head: {head} ({sha})\n",
        title = ctx.title,
        description = ctx.description().unwrap_or("[No description provided]"),
        total = ctx.changes.len(),
        files = files.join("\n"),
        base = ctx.base_ref,
        head = ctx.head_ref,
        sha = ctx.short_sha(),
    )
}
