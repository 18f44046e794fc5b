//! Shared test helpers: scripted provider and recording tool handler.

use prbot_core::error::ProviderError;
use prbot_core::message::ContentBlock;
use prbot_core::provider::{
    CompletionRequest, CompletionResponse, Provider, StopReason, ToolDefinition, Usage,
};
use prbot_core::tool::{ToolCall, ToolHandler};
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and
/// records the request. Panics if more calls are made than responses
/// provided.
pub struct SequentialMockProvider {
    responses: Vec<CompletionResponse>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<CompletionResponse>) -> Self {
        Self {
            responses,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that returns text-only responses, one per call.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| make_text_response(t)).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let index = requests.len();
        requests.push(request);

        match self.responses.get(index) {
            Some(response) => Ok(response.clone()),
            None => panic!(
                "SequentialMockProvider: no more responses (call #{index}, have {})",
                self.responses.len()
            ),
        }
    }
}

/// A provider whose every call fails.
pub struct FailingProvider;

#[async_trait::async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        Err(ProviderError::Network("connection reset".into()))
    }
}

fn usage() -> Option<Usage> {
    Some(Usage {
        input_tokens: 10,
        output_tokens: 5,
    })
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> CompletionResponse {
    CompletionResponse {
        content: vec![ContentBlock::text(text)],
        stop_reason: StopReason::EndTurn,
        usage: usage(),
        model: "mock-model".into(),
    }
}

/// Create a response that requests tools, stopping with `tool_use`.
pub fn make_tool_response(calls: &[(&str, &str, serde_json::Value)]) -> CompletionResponse {
    make_tool_response_with(calls, StopReason::ToolUse)
}

pub fn make_tool_response_with(
    calls: &[(&str, &str, serde_json::Value)],
    stop_reason: StopReason,
) -> CompletionResponse {
    let mut content = vec![ContentBlock::text("Let me look around.")];
    content.extend(
        calls
            .iter()
            .map(|(id, name, input)| ContentBlock::tool_use(*id, *name, input.clone())),
    );
    CompletionResponse {
        content,
        stop_reason,
        usage: usage(),
        model: "mock-model".into(),
    }
}

/// A tool handler that records every call and answers `"<name> result for <id>"`.
pub struct RecordingHandler {
    calls: Mutex<Vec<ToolCall>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ToolHandler for RecordingHandler {
    fn catalog(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: "list_directory".into(),
            description: "List a directory".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": { "path": { "type": "string" } }
            }),
        }]
    }

    async fn dispatch(&self, call: &ToolCall) -> String {
        self.calls.lock().unwrap().push(call.clone());
        format!("{} result for {}", call.name, call.id)
    }
}
