//! `prbot config`: print the effective configuration.

use std::path::Path;

use anyhow::Context;
use prbot_config::AppConfig;

pub fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = AppConfig::load(config_path).context("Failed to load configuration")?;

    println!("{}", config.to_redacted_toml());

    let missing: Vec<&str> = [
        ("ANTHROPIC_API_KEY", config.llm.api_key.is_none()),
        ("GITHUB_TOKEN", config.github.token.is_none()),
        ("GITHUB_REPOSITORY", config.github.repository.is_none()),
        ("GITHUB_EVENT_PATH", config.event_path.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();

    if !missing.is_empty() {
        eprintln!("Not set (required by `prbot review`): {}", missing.join(", "));
    }
    Ok(())
}
