//! The tool-use review loop.
//!
//! ```text
//!            tool calls                 results appended
//! AwaitingModel ─────────► DispatchingTools ─────────► AwaitingModel
//!      │ text only                 │ end_turn / budget spent
//!      ▼                           ▼
//!    Done (answer)        Done (summary request, no tools)
//! ```

use std::sync::Arc;

use prbot_core::error::Error;
use prbot_core::message::{Conversation, ToolResult};
use prbot_core::provider::{CompletionRequest, CompletionResponse, Provider, StopReason, ToolDefinition, Usage};
use prbot_core::tool::{ToolCall, ToolHandler};
use tracing::{debug, info, warn};

pub const INITIAL_PROMPT: &str = "Please begin your code review.";
pub const SUMMARY_PROMPT: &str =
    "Please provide your final code review summary now based on everything you've discovered.";
pub const EMPTY_SUMMARY_FALLBACK: &str = "Review completed but no final output was generated.";

pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

/// How the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The model answered with text only
    Answered,
    /// The model signalled end of turn while still calling tools
    SoftTerminal,
    /// The iteration ceiling was reached
    IterationLimit,
}

impl Termination {
    /// Whether the final text came from the extra summary request.
    pub fn summarized(&self) -> bool {
        !matches!(self, Self::Answered)
    }
}

/// Result of one loop run.
#[derive(Debug, Clone)]
pub struct LoopOutcome {
    pub text: String,
    pub termination: Termination,
    /// Tool-enabled model requests issued (the summary request is not counted)
    pub iterations: u32,
    /// Every model request, including the summary
    pub requests: u32,
    pub tool_calls: usize,
    pub usage: Usage,
    pub conversation: Conversation,
}

enum State {
    AwaitingModel,
    DispatchingTools { calls: Vec<ToolCall>, end_turn: bool },
    Done(Finish),
}

enum Finish {
    Answer(String),
    Summarize(Termination),
}

/// Drives a bounded request → dispatch → append cycle until the model answers.
pub struct ToolLoop {
    provider: Arc<dyn Provider>,
    handler: Arc<dyn ToolHandler>,
    model: String,
    max_iterations: u32,
    max_tokens: u32,
}

impl ToolLoop {
    pub fn new(provider: Arc<dyn Provider>, handler: Arc<dyn ToolHandler>, model: impl Into<String>) -> Self {
        Self {
            provider,
            handler,
            model: model.into(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_tokens: 4000,
        }
    }

    /// Set the maximum number of tool-enabled requests.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the max tokens per model response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    async fn request(
        &self,
        system: &str,
        conversation: &Conversation,
        tools: Vec<ToolDefinition>,
        usage: &mut Usage,
    ) -> Result<CompletionResponse, Error> {
        let request = CompletionRequest::new(&self.model, system, conversation)
            .with_tools(tools)
            .with_max_tokens(self.max_tokens);
        let response = self.provider.complete(request).await?;
        if let Some(u) = response.usage {
            *usage += u;
        }
        Ok(response)
    }

    /// Run the loop with `system` as the unmodified system instruction.
    ///
    /// Provider failures abort the run; tool failures never do, since the
    /// handler answers them with text.
    pub async fn run(&self, system: &str) -> Result<LoopOutcome, Error> {
        let catalog = self.handler.catalog();
        let mut conversation = Conversation::starting_with(INITIAL_PROMPT);
        let mut usage = Usage::default();
        let mut iterations = 0u32;
        let mut requests = 0u32;
        let mut tool_calls = 0usize;

        info!(
            model = %self.model,
            tools = catalog.len(),
            max_iterations = self.max_iterations,
            "Starting tool-assisted review"
        );

        let mut state = State::AwaitingModel;
        let finish = loop {
            state = match state {
                State::AwaitingModel if iterations >= self.max_iterations => {
                    warn!(iterations, "Max iterations reached, requesting final summary");
                    State::Done(Finish::Summarize(Termination::IterationLimit))
                }
                State::AwaitingModel => {
                    iterations += 1;
                    debug!(iteration = iterations, turns = conversation.len(), "Review loop iteration");

                    let response = self
                        .request(system, &conversation, catalog.clone(), &mut usage)
                        .await?;
                    requests += 1;

                    let calls = response.tool_calls();
                    conversation.push_assistant(response.content.clone());

                    if calls.is_empty() {
                        info!(iterations, "Review completed");
                        State::Done(Finish::Answer(response.text()))
                    } else {
                        State::DispatchingTools {
                            calls,
                            end_turn: response.stop_reason == StopReason::EndTurn,
                        }
                    }
                }
                State::DispatchingTools { calls, end_turn } => {
                    info!(iteration = iterations, count = calls.len(), "Executing tool(s)");

                    let mut results = Vec::with_capacity(calls.len());
                    for call in &calls {
                        let output = self.handler.dispatch(call).await;
                        debug!(tool = %call.name, id = %call.id, chars = output.len(), "Tool finished");
                        results.push(ToolResult::new(call.id.clone(), output));
                    }
                    tool_calls += calls.len();
                    conversation.push_tool_results(results)?;

                    if end_turn {
                        info!(iteration = iterations, "Model signalled end of turn with pending tool calls");
                        State::Done(Finish::Summarize(Termination::SoftTerminal))
                    } else {
                        State::AwaitingModel
                    }
                }
                State::Done(finish) => break finish,
            };
        };

        let (text, termination) = match finish {
            Finish::Answer(text) => (text, Termination::Answered),
            Finish::Summarize(termination) => {
                conversation.push_user(SUMMARY_PROMPT);
                let response = self.request(system, &conversation, Vec::new(), &mut usage).await?;
                requests += 1;
                conversation.push_assistant(response.content.clone());

                let text = response.text();
                if text.trim().is_empty() {
                    warn!("Summary request produced no text");
                    (EMPTY_SUMMARY_FALLBACK.to_string(), termination)
                } else {
                    (text, termination)
                }
            }
        };

        info!(
            iterations,
            requests,
            tool_calls,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            ?termination,
            "Tool-assisted review finished"
        );

        Ok(LoopOutcome {
            text,
            termination,
            iterations,
            requests,
            tool_calls,
            usage,
            conversation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use prbot_core::message::Turn;
    use serde_json::json;

    fn tool_loop(provider: &Arc<SequentialMockProvider>, handler: &Arc<RecordingHandler>) -> ToolLoop {
        ToolLoop::new(provider.clone(), handler.clone(), "mock-model")
    }

    #[tokio::test]
    async fn text_only_response_returns_immediately() {
        let provider = Arc::new(SequentialMockProvider::texts(&["All good."]));
        let handler = Arc::new(RecordingHandler::new());

        let outcome = tool_loop(&provider, &handler).run("review").await.unwrap();

        assert_eq!(outcome.text, "All good.");
        assert_eq!(outcome.termination, Termination::Answered);
        assert_eq!(provider.call_count(), 1);
        assert!(handler.calls().is_empty());
        // initial user turn + assistant
        assert_eq!(outcome.conversation.len(), 2);
    }

    #[tokio::test]
    async fn first_request_carries_system_catalog_and_opening_turn() {
        let provider = Arc::new(SequentialMockProvider::texts(&["ok"]));
        let handler = Arc::new(RecordingHandler::new());

        tool_loop(&provider, &handler)
            .with_max_tokens(1234)
            .run("You are a senior code reviewer.")
            .await
            .unwrap();

        let req = &provider.requests()[0];
        assert_eq!(req.system, "You are a senior code reviewer.");
        assert_eq!(req.max_tokens, 1234);
        assert_eq!(req.tools.len(), 1);
        assert_eq!(req.turns, vec![Turn::User(INITIAL_PROMPT.into())]);
    }

    #[tokio::test]
    async fn list_directory_then_answer() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_tool_response(&[("toolu_1", "list_directory", json!({"path": ""}))]),
            make_text_response("Looks fine overall."),
        ]));
        let handler = Arc::new(RecordingHandler::new());

        let outcome = tool_loop(&provider, &handler).run("review").await.unwrap();

        assert_eq!(outcome.text, "Looks fine overall.");
        assert_eq!(outcome.requests, 2);
        assert_eq!(provider.call_count(), 2);
        assert_eq!(handler.calls()[0].arguments, json!({"path": ""}));

        let second = &provider.requests()[1];
        assert_eq!(
            second.turns.last(),
            Some(&Turn::ToolResults(vec![ToolResult::new(
                "toolu_1",
                "list_directory result for toolu_1"
            )]))
        );
    }

    #[tokio::test]
    async fn multiple_calls_dispatched_in_emission_order() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_tool_response(&[
                ("a", "read_file", json!({"file_path": "x.rs"})),
                ("b", "search_code", json!({"pattern": "fn"})),
                ("c", "get_pr_context", json!({})),
            ]),
            make_text_response("done"),
        ]));
        let handler = Arc::new(RecordingHandler::new());

        let outcome = tool_loop(&provider, &handler).run("review").await.unwrap();

        let ids: Vec<_> = handler.calls().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(outcome.tool_calls, 3);

        match &outcome.conversation.turns()[2] {
            Turn::ToolResults(results) => {
                let result_ids: Vec<_> = results.iter().map(|r| r.tool_use_id.as_str()).collect();
                assert_eq!(result_ids, ["a", "b", "c"]);
            }
            other => panic!("expected tool results, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn iteration_ceiling_forces_summary_without_tools() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_tool_response(&[("t1", "list_directory", json!({}))]),
            make_tool_response(&[("t2", "list_directory", json!({}))]),
            make_text_response("Final summary."),
        ]));
        let handler = Arc::new(RecordingHandler::new());

        let outcome = tool_loop(&provider, &handler)
            .with_max_iterations(2)
            .run("review")
            .await
            .unwrap();

        assert_eq!(outcome.text, "Final summary.");
        assert_eq!(outcome.termination, Termination::IterationLimit);
        assert_eq!(outcome.iterations, 2);
        assert_eq!(provider.call_count(), 3);

        let requests = provider.requests();
        assert!(!requests[0].tools.is_empty());
        assert!(!requests[1].tools.is_empty());
        assert!(requests[2].tools.is_empty());
        assert_eq!(requests[2].turns.last(), Some(&Turn::User(SUMMARY_PROMPT.into())));
    }

    #[tokio::test]
    async fn end_turn_with_tool_calls_is_soft_terminal() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_tool_response_with(
                &[("t1", "read_file", json!({"file_path": "a.rs"}))],
                StopReason::EndTurn,
            ),
            make_text_response("Summary after soft stop."),
        ]));
        let handler = Arc::new(RecordingHandler::new());

        let outcome = tool_loop(&provider, &handler).run("review").await.unwrap();

        assert_eq!(outcome.termination, Termination::SoftTerminal);
        assert!(outcome.termination.summarized());
        assert_eq!(outcome.text, "Summary after soft stop.");
        // the pending call is still answered before the summary request
        assert_eq!(handler.calls().len(), 1);
        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].tools.is_empty());
    }

    #[tokio::test]
    async fn empty_summary_uses_fallback_text() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_tool_response(&[("t1", "list_directory", json!({}))]),
            make_text_response("   "),
        ]));
        let handler = Arc::new(RecordingHandler::new());

        let outcome = tool_loop(&provider, &handler)
            .with_max_iterations(1)
            .run("review")
            .await
            .unwrap();

        assert_eq!(outcome.text, EMPTY_SUMMARY_FALLBACK);
    }

    #[tokio::test]
    async fn conversation_only_grows_and_pairs_results() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_tool_response(&[("t1", "list_directory", json!({}))]),
            make_tool_response(&[("t2", "list_directory", json!({})), ("t3", "list_directory", json!({}))]),
            make_text_response("done"),
        ]));
        let handler = Arc::new(RecordingHandler::new());

        let outcome = tool_loop(&provider, &handler).run("review").await.unwrap();

        let requests = provider.requests();
        for pair in requests.windows(2) {
            assert!(pair[1].turns.len() > pair[0].turns.len());
            assert_eq!(pair[1].turns[..pair[0].turns.len()], pair[0].turns[..]);
        }
        // user, assistant, results, assistant, results, assistant
        assert_eq!(outcome.conversation.len(), 6);
        assert_eq!(outcome.usage.total(), 45);
    }

    #[tokio::test]
    async fn provider_failure_is_fatal() {
        let handler = Arc::new(RecordingHandler::new());
        let tool_loop = ToolLoop::new(Arc::new(FailingProvider), handler, "mock-model");

        let err = tool_loop.run("review").await.unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
    }
}
