//! Conversation domain types.
//!
//! A conversation is an append-only sequence of turns exchanged with the
//! model: plain user text, assistant content (text and tool-use blocks), and
//! user turns carrying tool results. Turns are never mutated or removed once
//! appended.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::tool::ToolCall;

/// Who authored a turn, as seen by the LLM API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single piece of assistant output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: serde_json::Value) -> Self {
        Self::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    /// The tool invocation carried by this block, if any.
    pub fn as_tool_call(&self) -> Option<ToolCall> {
        match self {
            Self::ToolUse { id, name, input } => Some(ToolCall {
                id: id.clone(),
                name: name.clone(),
                arguments: input.clone(),
            }),
            Self::Text { .. } => None,
        }
    }
}

/// Concatenate the text blocks in emission order, one per line.
pub fn joined_text(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .filter_map(|b| match b {
            ContentBlock::Text { text } => Some(text.as_str()),
            ContentBlock::ToolUse { .. } => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Every tool invocation in the blocks, in emission order.
pub fn tool_calls(blocks: &[ContentBlock]) -> Vec<ToolCall> {
    blocks.iter().filter_map(ContentBlock::as_tool_call).collect()
}

/// The dispatcher's answer to one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Id of the tool-use block this answers
    pub tool_use_id: String,

    pub content: String,
}

impl ToolResult {
    pub fn new(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
        }
    }
}

/// One entry in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum Turn {
    /// Plain user text
    User(String),
    /// Model output
    Assistant(Vec<ContentBlock>),
    /// Results for the invocations of the preceding assistant turn
    ToolResults(Vec<ToolResult>),
}

impl Turn {
    pub fn role(&self) -> Role {
        match self {
            Self::User(_) | Self::ToolResults(_) => Role::User,
            Self::Assistant(_) => Role::Assistant,
        }
    }
}

/// An ordered, append-only list of turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a conversation with a single user turn.
    pub fn starting_with(text: impl Into<String>) -> Self {
        let mut conversation = Self::new();
        conversation.push_user(text);
        conversation
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::User(text.into()));
    }

    pub fn push_assistant(&mut self, blocks: Vec<ContentBlock>) {
        self.turns.push(Turn::Assistant(blocks));
    }

    /// Append tool results answering the latest assistant turn.
    ///
    /// The results must line up one-to-one, in order, with the tool-use
    /// blocks of the immediately preceding assistant turn.
    pub fn push_tool_results(&mut self, results: Vec<ToolResult>) -> Result<(), Error> {
        let Some(Turn::Assistant(blocks)) = self.turns.last() else {
            return Err(Error::Internal(
                "tool results must follow an assistant turn".into(),
            ));
        };

        let pending: Vec<&str> = blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolUse { id, .. } => Some(id.as_str()),
                ContentBlock::Text { .. } => None,
            })
            .collect();
        let answered: Vec<&str> = results.iter().map(|r| r.tool_use_id.as_str()).collect();

        if pending != answered {
            return Err(Error::Internal(format!(
                "tool results {answered:?} do not match pending invocations {pending:?}"
            )));
        }

        self.turns.push(Turn::ToolResults(results));
        Ok(())
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
