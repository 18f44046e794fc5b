//! # prbot Core
//!
//! Domain types, traits, and error definitions for the prbot pull-request
//! reviewer. This crate does no I/O; it defines the model that the
//! provider, SCM, tool and agent crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here (LLM client, change-set
//! source, content fetcher, comment sink, tool handler). Implementations
//! live in their own crates, so the review loop can be exercised with
//! scripted mocks and the real backends can be swapped by configuration.

pub mod change;
pub mod error;
pub mod message;
pub mod provider;
pub mod scm;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use change::{ChangeDescriptor, ChangeKind, ReviewContext};
pub use error::{Error, Result};
pub use message::{ContentBlock, Conversation, ToolResult, Turn};
pub use provider::{CompletionRequest, CompletionResponse, Provider, StopReason, ToolDefinition, Usage};
pub use scm::{ChangeQuery, ChangeSource, CommentSink, ContentFetcher};
pub use tool::{ToolCall, ToolHandler};
