//! One review run, from the pull-request event to the delivered text.
//!
//! Collaborators arrive already constructed so the run can be driven by
//! real clients in CI and by scripted doubles in tests.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use prbot_agent::{FilePromptStore, PromptStore, SimpleReview, SingleShot, StagedReview, ToolLoop, system_prompt};
use prbot_config::{AppConfig, ReviewMode};
use prbot_core::change::ReviewContext;
use prbot_core::provider::Provider;
use prbot_core::scm::{ChangeSource, CommentSink, ContentFetcher};
use prbot_scm::PullRequestEvent;
use prbot_tools::ToolDispatcher;
use tracing::info;

use crate::reporter::Reporter;

/// Everything a run talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub provider: Arc<dyn Provider>,
    pub changes: Arc<dyn ChangeSource>,
    pub content: Arc<dyn ContentFetcher>,
    pub comments: Arc<dyn CommentSink>,
    pub prompts: Arc<dyn PromptStore>,
}

impl Collaborators {
    /// Template store rooted at the configured prompt directory.
    pub fn file_prompts(config: &AppConfig) -> Arc<dyn PromptStore> {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        Arc::new(FilePromptStore::new(prompts_root(&config.prompts_dir, exe_dir.as_deref())))
    }
}

/// Where a configured template directory lives.
///
/// A relative directory is looked up beside the executable first; the
/// working directory in CI is the repository under review.
pub fn prompts_root(dir: &Path, exe_dir: Option<&Path>) -> PathBuf {
    if dir.is_absolute() {
        return dir.to_path_buf();
    }
    exe_dir
        .map(|base| base.join(dir))
        .filter(|candidate| candidate.is_dir())
        .unwrap_or_else(|| dir.to_path_buf())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The change set was empty; the model was never called
    NoChanges,
    Reviewed { text: String },
}

/// Produce the review text for `ctx` with the configured mode.
pub async fn review_text(
    config: &AppConfig,
    ctx: ReviewContext,
    collab: &Collaborators,
) -> anyhow::Result<String> {
    let mode = config.review.mode;
    let system = system_prompt(
        collab.prompts.as_ref(),
        &config.review.domain,
        mode,
        &config.review.extra_instructions,
    );
    let model = config.llm.model.as_str();
    info!(mode = %mode, model, domain = %config.review.domain, "Starting review");

    let text = match mode {
        ReviewMode::Simple => {
            let session = SingleShot::new(collab.provider.clone(), model, system)
                .with_max_tokens(config.llm.max_tokens);
            SimpleReview::new(session).run(&ctx).await?
        }
        ReviewMode::Agentic => {
            let session = SingleShot::new(collab.provider.clone(), model, system)
                .with_max_tokens(config.llm.max_tokens);
            StagedReview::new(session, collab.prompts.clone(), collab.content.clone())
                .run(&ctx)
                .await?
        }
        ReviewMode::AgenticTools => {
            let dispatcher = ToolDispatcher::new(Arc::new(ctx)).with_remote(collab.content.clone());
            let outcome = ToolLoop::new(collab.provider.clone(), Arc::new(dispatcher), model)
                .with_max_iterations(config.review.max_iterations)
                .with_max_tokens(config.llm.max_tokens)
                .run(&system)
                .await?;
            info!(
                iterations = outcome.iterations,
                tool_calls = outcome.tool_calls,
                tokens = outcome.usage.total(),
                termination = ?outcome.termination,
                summarized = outcome.termination.summarized(),
                "Tool loop finished"
            );
            outcome.text
        }
    };
    Ok(text)
}

/// Run a review for `event` and deliver it.
///
/// Errors abort the run before anything is delivered; the reporter is
/// invoked at most once.
pub async fn run(
    config: &AppConfig,
    event: PullRequestEvent,
    collab: &Collaborators,
    out: &mut dyn Write,
) -> anyhow::Result<RunOutcome> {
    let (owner, repo) = config.repository()?;
    info!(pr = event.number, repo = %format!("{owner}/{repo}"), "Reviewing pull request");

    let changes = collab
        .changes
        .list_changes(&event.change_query())
        .await
        .context("Failed to list changed files")?;
    if changes.is_empty() {
        info!("No changed files, skipping");
        return Ok(RunOutcome::NoChanges);
    }
    info!(files = changes.len(), source = collab.changes.label(), "Changed files collected");

    let ctx = event.into_context(owner, repo, changes, config.checkout_dir());
    let text = review_text(config, ctx, collab).await?;

    Reporter::new(config.review.output, collab.comments.clone())
        .deliver(config.review.mode, &config.llm.model, &text, out)
        .await
        .context("Failed to deliver review")?;

    Ok(RunOutcome::Reviewed { text })
}
