//! Deadline helper with cancellation awareness.

use crate::RequestContext;
use std::future::Future;
use std::time::Duration;

/// Why a guarded future did not produce its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    /// The request context was cancelled first.
    Cancelled,
    /// The deadline elapsed first.
    TimedOut,
}

/// Race a future against the request's cancellation and a deadline.
///
/// No error type is imposed; callers map [`Interrupted`] into their own
/// failure taxonomy.
pub async fn race_with_context<F>(
    ctx: &RequestContext,
    timeout: Duration,
    fut: F,
) -> std::result::Result<F::Output, Interrupted>
where
    F: Future,
{
    if ctx.is_cancelled() {
        return Err(Interrupted::Cancelled);
    }

    tokio::select! {
        () = ctx.cancelled() => Err(Interrupted::Cancelled),
        res = tokio::time::timeout(timeout, fut) => res.map_err(|_| Interrupted::TimedOut),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn deadline_elapses() {
        let ctx = RequestContext::new_check();
        let slow = tokio::time::sleep(Duration::from_secs(30));
        let outcome = race_with_context(&ctx, Duration::from_secs(10), slow).await;
        assert_eq!(outcome, Err(Interrupted::TimedOut));
    }

    #[tokio::test]
    async fn cancellation_wins_over_pending_work() {
        let ctx = RequestContext::new_check();
        let canceller = ctx.clone();
        let task = tokio::spawn(async move {
            race_with_context(
                &ctx,
                Duration::from_secs(5),
                tokio::time::sleep(Duration::from_secs(60)),
            )
            .await
        });

        tokio::task::yield_now().await;
        canceller.cancel();
        let outcome = task.await.expect("join");
        assert_eq!(outcome, Err(Interrupted::Cancelled));
    }

    #[tokio::test]
    async fn already_cancelled_context_short_circuits() {
        let ctx = RequestContext::new_check();
        ctx.cancel();
        let outcome = race_with_context(&ctx, Duration::from_secs(1), async { 7 }).await;
        assert_eq!(outcome, Err(Interrupted::Cancelled));
    }

    #[tokio::test]
    async fn completed_work_is_returned() {
        let ctx = RequestContext::new_check();
        let outcome = race_with_context(&ctx, Duration::from_secs(1), async { 3 }).await;
        assert_eq!(outcome, Ok(3));
    }
}
