//! The tool dispatcher: model tool calls in, bounded text out.

use std::sync::Arc;

use async_trait::async_trait;
use prbot_core::change::ReviewContext;
use prbot_core::error::ToolError;
use prbot_core::provider::ToolDefinition;
use prbot_core::scm::ContentFetcher;
use prbot_core::tool::{ToolCall, ToolHandler};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::checkout::Checkout;
use crate::search_code::{CodeSearch, SearchQuery};
use crate::{list_directory, pr_context, read_file, search_code};

/// Every operation the reviewer model can request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewTool {
    ReadFile { file_path: String },
    SearchCode(SearchQuery),
    ListDirectory { path: String },
    GetPrContext,
}

#[derive(Deserialize)]
struct ReadFileArgs {
    #[serde(alias = "path")]
    file_path: String,
}

#[derive(Deserialize)]
struct SearchCodeArgs {
    pattern: String,
    #[serde(default, alias = "glob")]
    file_pattern: Option<String>,
    #[serde(default)]
    max_results: Option<u64>,
}

#[derive(Deserialize)]
struct ListDirectoryArgs {
    #[serde(default)]
    path: Option<String>,
}

fn parse_args<T: DeserializeOwned>(tool: &str, arguments: &serde_json::Value) -> Result<T, ToolError> {
    let value = if arguments.is_null() {
        serde_json::json!({})
    } else {
        arguments.clone()
    };
    serde_json::from_value(value).map_err(|e| ToolError::InvalidArguments(format!("{tool}: {e}")))
}

impl ReviewTool {
    /// Parse a model-issued call. Unknown names and malformed arguments are errors.
    pub fn from_call(call: &ToolCall) -> Result<Self, ToolError> {
        match call.name.as_str() {
            read_file::NAME => {
                let args: ReadFileArgs = parse_args(&call.name, &call.arguments)?;
                Ok(Self::ReadFile {
                    file_path: args.file_path,
                })
            }
            search_code::NAME => {
                let args: SearchCodeArgs = parse_args(&call.name, &call.arguments)?;
                Ok(Self::SearchCode(SearchQuery::new(
                    args.pattern,
                    args.file_pattern,
                    args.max_results,
                )))
            }
            list_directory::NAME => {
                let args: ListDirectoryArgs = parse_args(&call.name, &call.arguments)?;
                Ok(Self::ListDirectory {
                    path: args.path.unwrap_or_default(),
                })
            }
            pr_context::NAME => Ok(Self::GetPrContext),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ReadFile { .. } => read_file::NAME,
            Self::SearchCode(_) => search_code::NAME,
            Self::ListDirectory { .. } => list_directory::NAME,
            Self::GetPrContext => pr_context::NAME,
        }
    }

    /// The catalogue sent to the model, in a fixed order.
    pub fn catalog() -> Vec<ToolDefinition> {
        vec![
            read_file::definition(),
            search_code::definition(),
            list_directory::definition(),
            pr_context::definition(),
        ]
    }
}

/// Executes [`ReviewTool`]s against one pull request's checkout.
pub struct ToolDispatcher {
    context: Arc<ReviewContext>,
    checkout: Checkout,
    remote: Option<Arc<dyn ContentFetcher>>,
    search: CodeSearch,
}

impl ToolDispatcher {
    pub fn new(context: Arc<ReviewContext>) -> Self {
        let checkout = Checkout::new(context.checkout.clone());
        Self {
            context,
            checkout,
            remote: None,
            search: CodeSearch::default(),
        }
    }

    /// Used by `read_file` when a path is not in the local checkout.
    pub fn with_remote(mut self, remote: Arc<dyn ContentFetcher>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_search(mut self, search: CodeSearch) -> Self {
        self.search = search;
        self
    }

    pub async fn execute(&self, tool: &ReviewTool) -> Result<String, ToolError> {
        match tool {
            ReviewTool::ReadFile { file_path } => {
                read_file::run(
                    &self.checkout,
                    self.remote.as_deref(),
                    &self.context.head_sha,
                    file_path,
                )
                .await
            }
            ReviewTool::SearchCode(query) => self.search.run(self.checkout.root(), query).await,
            ReviewTool::ListDirectory { path } => list_directory::run(&self.checkout, path).await,
            ReviewTool::GetPrContext => Ok(pr_context::render(&self.context)),
        }
    }
}

/// Turn a tool failure into the text the model sees.
fn describe(err: &ToolError, call: &ToolCall) -> String {
    match err {
        ToolError::UnknownTool(name) => format!("Unknown tool: {name}"),
        ToolError::InvalidArguments(reason) => format!("Error: invalid arguments for {reason}"),
        ToolError::Timeout { timeout_secs, .. } => {
            format!("Search timed out (>{timeout_secs}s). Try a more specific pattern.")
        }
        ToolError::PathOutsideCheckout(path) => {
            format!("Error: path '{path}' is outside the repository checkout; use a relative path.")
        }
        ToolError::ExecutionFailed { reason, .. } => format!("Error running {}: {reason}", call.name),
    }
}

#[async_trait]
impl ToolHandler for ToolDispatcher {
    fn catalog(&self) -> Vec<ToolDefinition> {
        ReviewTool::catalog()
    }

    async fn dispatch(&self, call: &ToolCall) -> String {
        info!(tool = %call.name, arguments = %call.arguments, "Executing tool");

        let result = match ReviewTool::from_call(call) {
            Ok(tool) => self.execute(&tool).await,
            Err(e) => Err(e),
        };

        result.unwrap_or_else(|e| {
            warn!(tool = %call.name, error = %e, "Tool call failed");
            describe(&e, call)
        })
    }
}
