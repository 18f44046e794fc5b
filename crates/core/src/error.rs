//! Error types for the prbot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for a review run.
///
/// Anything that reaches this type is fatal: the run aborts and nothing is
/// posted. Recoverable conditions (tool failures, missing files) never get
/// here; they are folded into review text by the component that saw them.
#[derive(Debug, Error)]
pub enum Error {
    // --- LLM client errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Source-control errors ---
    #[error("SCM error: {0}")]
    Scm(#[from] ScmError),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Error)]
pub enum ScmError {
    #[error("SCM API request failed: {message} (status: {status_code})")]
    Api {
        status_code: u16,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("git command failed: {0}")]
    Git(String),

    #[error("Failed to decode content: {0}")]
    Decode(String),

    #[error("Invalid CI event payload: {0}")]
    InvalidEvent(String),
}

/// Failures inside the tool dispatcher.
///
/// These never cross the dispatcher boundary as errors: the dispatcher
/// renders them into the tool result text so the model can react.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Path '{0}' is outside the repository checkout")]
    PathOutsideCheckout(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn scm_error_converts_into_top_level() {
        let err: Error = ScmError::Api {
            status_code: 502,
            message: "bad gateway".into(),
        }
        .into();
        assert!(matches!(err, Error::Scm(_)));
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn tool_error_displays_correctly() {
        let err = ToolError::Timeout {
            tool_name: "search_code".into(),
            timeout_secs: 30,
        };
        assert!(err.to_string().contains("search_code"));
        assert!(err.to_string().contains("30s"));
    }
}
