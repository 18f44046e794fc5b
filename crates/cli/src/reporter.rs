//! Delivery of the finished review: a PR comment or a stdout block.

use std::io::Write;
use std::sync::Arc;

use prbot_config::{OutputMode, ReviewMode};
use prbot_core::scm::CommentSink;
use tracing::info;

pub const LOG_BANNER_START: &str = "====== LLM REVIEW (log only) ======";
pub const LOG_BANNER_END: &str = "====== END ======";

const TOOL_REVIEW_FOOTER: &str = "*This review was generated by Claude using iterative tool calling \
to explore the codebase and gather context.*";

/// The comment body posted for `mode`.
pub fn comment_body(mode: ReviewMode, model: &str, review: &str) -> String {
    match mode {
        ReviewMode::AgenticTools => format!(
            "### Agentic Code Review (Claude with Tools)\n\n**Model:** {model}\n\n{review}\n\n---\n{TOOL_REVIEW_FOOTER}\n"
        ),
        ReviewMode::Simple | ReviewMode::Agentic => {
            format!("### 🤖 Claude Review (model: {model}, mode: {mode})\n\n{review}")
        }
    }
}

/// The block printed in log mode.
pub fn log_block(review: &str) -> String {
    format!("{LOG_BANNER_START}\n{review}\n{LOG_BANNER_END}\n")
}

/// Where the review goes.
pub enum Reporter {
    Comment(Arc<dyn CommentSink>),
    Log,
}

impl Reporter {
    pub fn new(output: OutputMode, sink: Arc<dyn CommentSink>) -> Self {
        match output {
            OutputMode::Comment => Self::Comment(sink),
            OutputMode::Log => Self::Log,
        }
    }

    /// Deliver exactly once. Log output is written to `out`.
    pub async fn deliver(
        &self,
        mode: ReviewMode,
        model: &str,
        review: &str,
        out: &mut dyn Write,
    ) -> anyhow::Result<()> {
        match self {
            Self::Comment(sink) => {
                sink.post_comment(&comment_body(mode, model, review)).await?;
                info!("Review posted to pull request");
            }
            Self::Log => {
                out.write_all(log_block(review).as_bytes())?;
                out.flush()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use prbot_core::error::ScmError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CapturingSink {
        posted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CommentSink for CapturingSink {
        async fn post_comment(&self, body: &str) -> Result<(), ScmError> {
            self.posted.lock().unwrap().push(body.to_string());
            Ok(())
        }
    }

    struct RejectingSink;

    #[async_trait]
    impl CommentSink for RejectingSink {
        async fn post_comment(&self, _body: &str) -> Result<(), ScmError> {
            Err(ScmError::Api {
                status_code: 403,
                message: "Resource not accessible by integration".into(),
            })
        }
    }

    #[test]
    fn chained_modes_use_the_model_and_mode_header() {
        let body = comment_body(ReviewMode::Agentic, "claude-x", "All good.");
        assert_eq!(body, "### 🤖 Claude Review (model: claude-x, mode: agentic)\n\nAll good.");
    }

    #[test]
    fn tool_mode_has_header_and_footer() {
        let body = comment_body(ReviewMode::AgenticTools, "claude-x", "Found a bug.");
        assert!(body.starts_with("### Agentic Code Review (Claude with Tools)\n\n**Model:** claude-x"));
        assert!(body.contains("\n\nFound a bug.\n\n---\n"));
        assert!(body.trim_end().ends_with("gather context.*"));
    }

    #[tokio::test]
    async fn log_mode_writes_banners_and_never_posts() {
        let sink = Arc::new(CapturingSink::default());
        let reporter = Reporter::new(OutputMode::Log, sink.clone());
        let mut out = Vec::new();

        reporter
            .deliver(ReviewMode::Simple, "m", "Looks fine.", &mut out)
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "====== LLM REVIEW (log only) ======\nLooks fine.\n====== END ======\n"
        );
        assert!(sink.posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn comment_mode_posts_once() {
        let sink = Arc::new(CapturingSink::default());
        let reporter = Reporter::new(OutputMode::Comment, sink.clone());
        let mut out = Vec::new();

        reporter
            .deliver(ReviewMode::Simple, "m", "Looks fine.", &mut out)
            .await
            .unwrap();

        let posted = sink.posted.lock().unwrap();
        assert_eq!(posted.len(), 1);
        assert!(posted[0].ends_with("\n\nLooks fine."));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn comment_failure_is_an_error() {
        let reporter = Reporter::new(OutputMode::Comment, Arc::new(RejectingSink));
        let err = reporter
            .deliver(ReviewMode::Simple, "m", "text", &mut Vec::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("403"));
    }
}
