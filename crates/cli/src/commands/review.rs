//! `prbot review`: the CI entry point.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use prbot::pipeline::{self, Collaborators, RunOutcome};
use prbot_config::AppConfig;
use prbot_providers::AnthropicProvider;
use prbot_scm::{ChangeSourceChain, GitHubClient, LocalGitChanges, PullRequestEvent};
use tracing::info;

pub async fn run(
    config_path: Option<&Path>,
    mode: Option<String>,
    output: Option<String>,
) -> anyhow::Result<()> {
    let mut config = AppConfig::load(config_path).context("Failed to load configuration")?;
    if let Some(mode) = mode {
        config.review.mode = mode.parse()?;
    }
    if let Some(output) = output {
        config.review.output = output.parse()?;
    }

    let event_path = config.require_event_path()?;
    let Some(event) = PullRequestEvent::load(event_path)
        .with_context(|| format!("Failed to read event payload {}", event_path.display()))?
    else {
        info!("Not a pull_request event, skipping");
        return Ok(());
    };

    let (owner, repo) = config.repository()?;
    let github = GitHubClient::new(config.require_github_token()?, owner, repo)?
        .with_api_url(config.github.api_url.clone());
    let provider = AnthropicProvider::new(config.require_api_key()?)?
        .with_base_url(config.llm.base_url.clone());

    // Local diff first; the API listing covers shallow or missing checkouts
    let changes = ChangeSourceChain::new()
        .then(LocalGitChanges::new(config.checkout_dir()))
        .then(github.clone());

    let collab = Collaborators {
        provider: Arc::new(provider),
        changes: Arc::new(changes),
        content: Arc::new(github.clone()),
        comments: Arc::new(github.comments_for(event.number)),
        prompts: Collaborators::file_prompts(&config),
    };

    let mut stdout = std::io::stdout();
    match pipeline::run(&config, event, &collab, &mut stdout).await? {
        RunOutcome::NoChanges => info!("Nothing to review"),
        RunOutcome::Reviewed { text } => info!(chars = text.len(), "Review complete"),
    }
    Ok(())
}
