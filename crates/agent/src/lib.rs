//! Review strategies for prbot.
//!
//! Three ways to turn a [`prbot_core::ReviewContext`] into review text:
//!
//! 1. **Simple**: one prompt with the diff ([`modes::SimpleReview`])
//! 2. **Staged**: plan → per-file analysis → synthesis by prompt chaining
//!    ([`modes::StagedReview`])
//! 3. **Tool-assisted**: the model explores the repository through tools
//!    until it stops asking or the iteration ceiling is hit
//!    ([`loop_runner::ToolLoop`])
//!
//! The system instruction for all three comes from [`prompt`].

pub mod diff;
pub mod loop_runner;
pub mod modes;
pub mod prompt;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use loop_runner::{LoopOutcome, Termination, ToolLoop};
pub use modes::{ReviewPlan, SimpleReview, SingleShot, StagedReview};
pub use prompt::{FilePromptStore, PromptStore, Stage, system_prompt};
