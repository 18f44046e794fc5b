//! Ordered change-source strategies.

use async_trait::async_trait;
use prbot_core::change::ChangeDescriptor;
use prbot_core::error::ScmError;
use prbot_core::scm::{ChangeQuery, ChangeSource};
use tracing::{info, warn};

/// Tries each source in order; the first non-empty answer wins.
///
/// An error or empty answer from any source except the last is logged and
/// the next source is tried. The last source's error propagates. When every
/// source answers empty the result is an empty list.
pub struct ChangeSourceChain {
    sources: Vec<Box<dyn ChangeSource>>,
}

impl ChangeSourceChain {
    pub fn new() -> Self {
        Self { sources: Vec::new() }
    }

    pub fn then(mut self, source: impl ChangeSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }
}

impl Default for ChangeSourceChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChangeSource for ChangeSourceChain {
    fn label(&self) -> &str {
        "chain"
    }

    async fn list_changes(&self, query: &ChangeQuery) -> Result<Vec<ChangeDescriptor>, ScmError> {
        let last = self.sources.len().saturating_sub(1);

        for (idx, source) in self.sources.iter().enumerate() {
            match source.list_changes(query).await {
                Ok(changes) if !changes.is_empty() => {
                    info!(source = source.label(), files = changes.len(), "Change set resolved");
                    return Ok(changes);
                }
                Ok(_) => {
                    info!(source = source.label(), "Source returned no changes");
                }
                Err(e) if idx < last => {
                    warn!(source = source.label(), error = %e, "Change source failed, trying next");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prbot_core::change::ChangeKind;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        label: &'static str,
        answer: Result<Vec<ChangeDescriptor>, ScmError>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ChangeSource for Fixed {
        fn label(&self) -> &str {
            self.label
        }

        async fn list_changes(&self, _query: &ChangeQuery) -> Result<Vec<ChangeDescriptor>, ScmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }
    }

    fn fixed(label: &'static str, answer: Result<Vec<ChangeDescriptor>, ScmError>) -> (Fixed, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Fixed {
                label,
                answer,
                calls: calls.clone(),
            },
            calls,
        )
    }

    fn query() -> ChangeQuery {
        ChangeQuery {
            base_ref: "main".into(),
            head_ref: "topic".into(),
            pr_number: 3,
        }
    }

    fn one_change(path: &str) -> Vec<ChangeDescriptor> {
        vec![ChangeDescriptor::new(path, ChangeKind::Modified)]
    }

    #[tokio::test]
    async fn first_success_wins() {
        let (local, _) = fixed("local", Ok(one_change("a.rs")));
        let (api, api_calls) = fixed("api", Ok(one_change("b.rs")));
        let chain = ChangeSourceChain::new().then(local).then(api);

        let changes = chain.list_changes(&query()).await.unwrap();
        assert_eq!(changes[0].path, "a.rs");
        assert_eq!(api_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failure_and_empty_fall_through() {
        let (local, _) = fixed("local", Err(ScmError::Git("bad revision".into())));
        let (empty, _) = fixed("empty", Ok(Vec::new()));
        let (api, _) = fixed("api", Ok(one_change("b.rs")));
        let chain = ChangeSourceChain::new().then(local).then(empty).then(api);

        let changes = chain.list_changes(&query()).await.unwrap();
        assert_eq!(changes[0].path, "b.rs");
    }

    #[tokio::test]
    async fn last_error_propagates() {
        let (local, _) = fixed("local", Ok(Vec::new()));
        let (api, _) = fixed("api", Err(ScmError::Network("down".into())));
        let chain = ChangeSourceChain::new().then(local).then(api);

        assert!(matches!(
            chain.list_changes(&query()).await,
            Err(ScmError::Network(_))
        ));
    }

    #[tokio::test]
    async fn all_empty_is_empty() {
        let (a, _) = fixed("a", Ok(Vec::new()));
        let chain = ChangeSourceChain::new().then(a);
        assert!(chain.list_changes(&query()).await.unwrap().is_empty());
        assert!(ChangeSourceChain::default().list_changes(&query()).await.unwrap().is_empty());
    }
}
