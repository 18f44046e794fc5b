//! Tool handler trait: the seam between the review loop and the tools.
//!
//! The loop only knows how to hand a [`ToolCall`] to a [`ToolHandler`] and
//! get text back. Turning a call into a concrete operation, and every
//! failure into explanatory text, is the handler's job.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::provider::ToolDefinition;

/// A request to execute a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the LLM's tool_use id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value, unvalidated
    pub arguments: serde_json::Value,
}

/// Executes tool calls on behalf of the review loop.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// The catalogue sent to the model.
    fn catalog(&self) -> Vec<ToolDefinition>;

    /// Execute one call and return its bounded, human-readable result.
    ///
    /// Infallible by contract: bad arguments, timeouts and missing paths
    /// come back as text.
    async fn dispatch(&self, call: &ToolCall) -> String;
}
