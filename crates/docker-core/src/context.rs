//! Per-request cancellation and deadlines.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Cancellation handle threaded from the caller down to the transport.
///
/// API clients never create cancellation themselves; they forward whatever the
/// caller put here. An empty context never cancels and uses the client's
/// configured timeout.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: Option<CancellationToken>,
    timeout: Option<Duration>,
}

impl RequestContext {
    /// Create a context that never cancels.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort the request when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Abort the request once `timeout` has elapsed.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The cancellation token, if any.
    #[must_use]
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    /// The request deadline, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns true once the caller has cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Resolves when the token fires; pends forever without one.
    pub async fn cancelled(&self) {
        match &self.cancel {
            Some(token) => token.cancelled().await,
            None => std::future::pending().await,
        }
    }
}
