//! `prbot prompt`: show the system instruction a review would use.

use std::path::Path;

use anyhow::Context;
use prbot::Collaborators;
use prbot_agent::system_prompt;
use prbot_config::AppConfig;

pub fn run(config_path: Option<&Path>, mode: Option<String>, domain: Option<String>) -> anyhow::Result<()> {
    let mut config = AppConfig::load(config_path).context("Failed to load configuration")?;
    if let Some(mode) = mode {
        config.review.mode = mode.parse()?;
    }
    if let Some(domain) = domain {
        config.review.domain = domain;
    }

    let store = Collaborators::file_prompts(&config);
    let prompt = system_prompt(
        store.as_ref(),
        &config.review.domain,
        config.review.mode,
        &config.review.extra_instructions,
    );

    eprintln!(
        "# domain: {}, mode: {}, templates: {}",
        config.review.domain,
        config.review.mode,
        config.prompts_dir.display()
    );
    println!("{prompt}");
    Ok(())
}
