//! Provider trait: the abstraction over the LLM backend.
//!
//! A Provider is a stateless request/response wrapper: given a system
//! instruction, the conversation so far and an optional tool catalogue, it
//! returns the model's next content blocks plus a stop indicator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::{self, ContentBlock, Conversation, Turn};
use crate::tool::ToolCall;

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name (unique within a catalogue)
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's required and optional arguments
    pub parameters: serde_json::Value,
}

/// A single completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "claude-sonnet-4-5-20250929")
    pub model: String,

    /// System instruction, passed through unmodified
    pub system: String,

    /// The full conversation so far
    pub turns: Vec<Turn>,

    /// Tools the model may call; empty means no catalogue is attached
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Maximum tokens to generate
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, system: impl Into<String>, conversation: &Conversation) -> Self {
        Self {
            model: model.into(),
            system: system.into(),
            turns: conversation.turns().to_vec(),
            tools: Vec::new(),
            max_tokens: 4000,
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of the assistant's turn
    EndTurn,
    /// The model paused to have tools executed
    ToolUse,
    MaxTokens,
    StopSequence,
    Other(String),
}

impl StopReason {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("end_turn") => Self::EndTurn,
            Some("tool_use") => Self::ToolUse,
            Some("max_tokens") => Self::MaxTokens,
            Some("stop_sequence") => Self::StopSequence,
            Some(other) => Self::Other(other.to_string()),
            None => Self::Other(String::new()),
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

impl std::ops::AddAssign for Usage {
    fn add_assign(&mut self, rhs: Self) {
        self.input_tokens += rhs.input_tokens;
        self.output_tokens += rhs.output_tokens;
    }
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Content blocks in the order the model emitted them
    pub content: Vec<ContentBlock>,

    pub stop_reason: StopReason,

    pub usage: Option<Usage>,

    /// Which model actually responded
    pub model: String,
}

impl CompletionResponse {
    /// Text blocks joined in order.
    pub fn text(&self) -> String {
        message::joined_text(&self.content)
    }

    /// Tool invocations in emission order.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        message::tool_calls(&self.content)
    }
}

/// The core Provider trait.
///
/// The review modes call `complete()` without knowing which backend is
/// being used. Implementations must not retry internally on behalf of the
/// caller; a transport failure is returned as-is.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;
}
