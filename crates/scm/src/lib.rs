//! Source-control collaborators for prbot.
//!
//! - [`GitHubClient`]: REST API backed change listing, content fetch and
//!   comment posting.
//! - [`LocalGitChanges`]: `git diff` against the local checkout.
//! - [`ChangeSourceChain`]: ordered strategies, first non-empty answer wins.
//! - [`event`]: the CI pull-request event payload.

pub mod chain;
pub mod event;
pub mod github;
pub mod local_git;

pub use chain::ChangeSourceChain;
pub use event::PullRequestEvent;
pub use github::{GitHubClient, PullRequestComments};
pub use local_git::LocalGitChanges;
