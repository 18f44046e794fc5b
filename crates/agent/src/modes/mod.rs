//! Review modes built on prompt chaining.
//!
//! 1. **Simple**: one prompt with the PR diff, one answer
//! 2. **Staged**: plan → per-file analysis → synthesis, falling back to
//!    the simple review when the plan cannot be parsed
//!
//! The tool-using mode lives in [`crate::loop_runner`].

pub mod simple;
pub mod staged;

pub use simple::SimpleReview;
pub use staged::{ReviewPlan, StagedReview};

use std::sync::Arc;

use prbot_core::error::Error;
use prbot_core::message::Conversation;
use prbot_core::provider::{CompletionRequest, Provider};
use tracing::debug;

/// A fixed system instruction sent with single-turn, tool-less requests.
#[derive(Clone)]
pub struct SingleShot {
    provider: Arc<dyn Provider>,
    model: String,
    max_tokens: u32,
    system: String,
}

impl SingleShot {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, system: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: 4000,
            system: system.into(),
        }
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    /// Send `prompt` as the only user turn; returns the trimmed text reply.
    pub async fn ask(&self, prompt: &str) -> Result<String, Error> {
        let conversation = Conversation::starting_with(prompt);
        let request = CompletionRequest::new(&self.model, &self.system, &conversation)
            .with_max_tokens(self.max_tokens);

        debug!(model = %self.model, prompt_chars = prompt.len(), "Single-shot request");
        let response = self.provider.complete(request).await?;
        Ok(response.text().trim().to_string())
    }
}
