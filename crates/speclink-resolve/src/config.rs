use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use url::Url;

/// Configuration for a resolution pass.
#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    /// Follow references into other documents. Off by default: any
    /// reference leaving the current document fails fast.
    pub external_refs: bool,
    /// Location of the document being resolved; relative locators are
    /// joined against it. The working directory is used when absent.
    pub root: Option<Url>,
    /// Abort once this instant has passed.
    pub deadline: Option<Instant>,
    /// Abort once this token is cancelled.
    pub cancel: Option<CancellationToken>,
}

impl ResolverConfig {
    /// Enable or disable external references.
    pub fn external_refs(mut self, enabled: bool) -> Self {
        self.external_refs = enabled;
        self
    }

    pub fn root(mut self, location: Url) -> Self {
        self.root = Some(location);
        self
    }

    /// Set the deadline `timeout` from now.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_refs_disabled_by_default() {
        let config = ResolverConfig::default();
        assert!(!config.external_refs);
        assert!(config.root.is_none());
        assert!(config.deadline.is_none());
    }

    #[test]
    fn builder_sets_fields() {
        let token = CancellationToken::new();
        let config = ResolverConfig::default()
            .external_refs(true)
            .timeout(Duration::from_secs(5))
            .cancel(token.clone());
        assert!(config.external_refs);
        assert!(config.deadline.is_some_and(|d| d > Instant::now()));
        token.cancel();
        assert!(config.cancel.is_some_and(|t| t.is_cancelled()));
    }
}
