//! Staged review: plan, per-file deep dives, then a synthesis.
//!
//! The planning reply must be a JSON object
//! `{"summary": ..., "global_risks": [...], "focus_files": [...]}`. When it
//! isn't, the run degrades to the single-shot review instead of failing.

use std::sync::Arc;

use prbot_core::change::ReviewContext;
use prbot_core::error::Error;
use prbot_core::scm::ContentFetcher;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{SimpleReview, SingleShot};
use super::simple::NO_DESCRIPTION;
use crate::diff::{FILE_DIFF_LIMIT, PLANNING_DIFF_LIMIT, build_diff, build_single_file_diff};
use crate::prompt::{PromptStore, Stage};

/// At most this many focus files get their own analysis call.
pub const MAX_FOCUS_FILES: usize = 5;

/// Head content embedded in a per-file prompt is cut at this many chars.
pub const FILE_CONTENT_LIMIT: usize = 12_000;

/// The model's plan for the review.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewPlan {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub global_risks: Vec<serde_json::Value>,
    #[serde(default)]
    pub focus_files: Vec<String>,
}

impl ReviewPlan {
    /// Parse the planning reply, tolerating a surrounding code fence.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(strip_fence(raw)).ok()
    }
}

fn strip_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// One analysed focus file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileNote {
    pub path: String,
    pub analysis: String,
}

pub struct StagedReview {
    session: SingleShot,
    prompts: Arc<dyn PromptStore>,
    content: Arc<dyn ContentFetcher>,
}

impl StagedReview {
    pub fn new(session: SingleShot, prompts: Arc<dyn PromptStore>, content: Arc<dyn ContentFetcher>) -> Self {
        Self {
            session,
            prompts,
            content,
        }
    }

    fn planning_prompt(&self, ctx: &ReviewContext) -> String {
        format!(
            "\nHere is the PR information:\n\nTitle: {}\nDescription: {}\n\n\
             Here is a trimmed global diff:\n\n{}\n\n{}\n",
            ctx.title,
            ctx.description().unwrap_or(NO_DESCRIPTION),
            build_diff(&ctx.changes, PLANNING_DIFF_LIMIT),
            self.prompts.stage_template(Stage::Planning),
        )
    }

    fn per_file_prompt(&self, ctx: &ReviewContext, path: &str, diff: &str, content: &str) -> String {
        let content = match content.char_indices().nth(FILE_CONTENT_LIMIT) {
            Some((idx, _)) => format!("{}\n[... FILE CONTENT TRUNCATED ...]", &content[..idx]),
            None => content.to_string(),
        };
        format!(
            "\nFile: {path}\nPR Title: {}\n\nDiff:\n{}\n\n\
             Current full file content (may be truncated):\n{}\n\n{}\n",
            ctx.title,
            if diff.is_empty() { "[no diff]" } else { diff },
            if content.is_empty() { "[file not present at head]" } else { content.as_str() },
            self.prompts.stage_template(Stage::PerFile),
        )
    }

    fn final_prompt(&self, plan: &ReviewPlan, notes: &[FileNote]) -> String {
        let plan_json = serde_json::to_string_pretty(plan).unwrap_or_default();
        let per_file: String = notes
            .iter()
            .map(|n| format!("\n\n---\n\n### File: `{}`\n\n{}\n", n.path, n.analysis))
            .collect();
        format!(
            "\nReview plan:\n{plan_json}\n\nPer-file deep analysis:\n{}\n\n{}\n",
            if per_file.is_empty() { "[No per-file analysis]" } else { per_file.as_str() },
            self.prompts.stage_template(Stage::Final),
        )
    }

    async fn analyse_focus_files(&self, ctx: &ReviewContext, plan: &ReviewPlan) -> Result<Vec<FileNote>, Error> {
        let mut notes = Vec::new();

        for path in plan.focus_files.iter().take(MAX_FOCUS_FILES) {
            let Some(change) = ctx.find_change(path) else {
                debug!(path = %path, "Focus file is not part of the change set, skipping");
                continue;
            };

            let diff = build_single_file_diff(change, FILE_DIFF_LIMIT);
            let content = self.content.fetch_content(path, &ctx.head_sha).await?;
            if diff.is_empty() && content.is_empty() {
                debug!(path = %path, "Nothing to analyse, skipping");
                continue;
            }

            info!(path = %path, "Analysing focus file");
            let analysis = self
                .session
                .ask(&self.per_file_prompt(ctx, path, &diff, &content))
                .await?;
            notes.push(FileNote {
                path: path.clone(),
                analysis,
            });
        }

        Ok(notes)
    }

    pub async fn run(&self, ctx: &ReviewContext) -> Result<String, Error> {
        info!(files = ctx.changes.len(), "Running staged review");

        let raw_plan = self.session.ask(&self.planning_prompt(ctx)).await?;
        let Some(plan) = ReviewPlan::parse(&raw_plan) else {
            warn!("Review plan is not valid JSON, falling back to simple review");
            return SimpleReview::new(self.session.clone()).run(ctx).await;
        };
        info!(
            focus_files = plan.focus_files.len(),
            risks = plan.global_risks.len(),
            "Review plan parsed"
        );

        let notes = self.analyse_focus_files(ctx, &plan).await?;
        self.session.ask(&self.final_prompt(&plan, &notes)).await
    }
}
