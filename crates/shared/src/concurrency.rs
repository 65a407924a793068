//! Request-scoped context: correlation ids and cooperative cancellation.
//!
//! A check session creates one [`RequestContext`] per submission. Resetting
//! the session cancels that context; every port implementation is expected to
//! race its work against [`RequestContext::cancelled`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;

/// A correlation identifier used for logging/telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(Arc<str>);

impl CorrelationId {
    /// Create a new check id (`chk_N`), unique within this process.
    #[must_use]
    pub fn new_check_id() -> Self {
        let n = CHECK_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(Arc::<str>::from(format!("chk_{n}")))
    }

    /// Borrow the identifier as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

static CHECK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Request-scoped context passed across port boundaries.
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: CorrelationId,
    cancellation: CancellationToken,
}

impl RequestContext {
    /// Create a new context with a fresh cancellation token.
    #[must_use]
    pub fn new(correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            cancellation: CancellationToken::new(),
        }
    }

    /// Create a context with an auto-generated `chk_*` id.
    #[must_use]
    pub fn new_check() -> Self {
        Self::new(CorrelationId::new_check_id())
    }

    /// Return the correlation id.
    #[must_use]
    pub const fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// Returns true if the request was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Cancel this request.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Await cancellation.
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await;
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_ids_are_unique_and_prefixed() {
        let first = CorrelationId::new_check_id();
        let second = CorrelationId::new_check_id();
        assert_ne!(first, second);
        assert!(first.as_str().starts_with("chk_"));
    }

    #[test]
    fn clones_share_cancellation() {
        let ctx = RequestContext::new_check();
        let clone = ctx.clone();
        assert_eq!(ctx.correlation_id(), clone.correlation_id());

        clone.cancel();
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_future_resolves_after_cancel() {
        let ctx = RequestContext::new_check();
        let waiter = ctx.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });
        tokio::task::yield_now().await;
        ctx.cancel();
        assert!(task.await.is_ok());
    }
}
