//! prbot: review a pull request with an LLM from a CI job.
//!
//! The binary wires real clients into [`pipeline::run`]; integration tests
//! drive the same function with scripted collaborators.

pub mod pipeline;
pub mod reporter;

pub use pipeline::{Collaborators, RunOutcome};
pub use reporter::Reporter;
