//! Per-call cancellation and deadlines.
//!
//! A [`RequestContext`] is threaded through every execute and paginate call.
//! It bounds the total latency of a call, including a refresh-and-retry
//! sequence or a multi-page walk, and lets another task abandon the call.
//! When it fires, the in-flight future is dropped and the call returns
//! [`ClientError::Cancelled`].

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::clients::errors::{CancelReason, ClientError};

/// Cancellation token plus optional deadline for one logical call.
///
/// Cloning a context shares its token: cancelling any clone cancels all of them.
///
/// # Example
///
/// ```rust,ignore
/// use std::time::Duration;
/// use cloud_api::clients::RequestContext;
///
/// let ctx = RequestContext::with_timeout(Duration::from_secs(60));
/// let handle = ctx.clone();
///
/// // Another task may call `handle.cancel()` to abandon the walk.
/// client.paginate("/v2/apps", &ctx, |app: App| { println!("{}", app.name); true }).await?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Creates a context with no deadline that is never cancelled unless asked.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context whose deadline is `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().deadline(Instant::now() + timeout)
    }

    /// Creates a context driven by an existing cancellation token.
    #[must_use]
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Sets the deadline, keeping the earlier one if a deadline is already set.
    #[must_use]
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(self.deadline.map_or(deadline, |current| current.min(deadline)));
        self
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn deadline_at(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the cancellation token backing this context.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancels this context and every clone of it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Fails if the context is already cancelled or past its deadline.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Cancelled`] with the reason.
    pub fn check(&self) -> Result<(), ClientError> {
        if self.token.is_cancelled() {
            return Err(ClientError::Cancelled(CancelReason::Cancelled));
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(ClientError::Cancelled(CancelReason::DeadlineExceeded));
        }
        Ok(())
    }

    /// Drives `future` to completion unless the context fires first.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Cancelled`] if the token is cancelled or the
    /// deadline passes before `future` completes; `future` is dropped.
    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output, ClientError> {
        self.check()?;

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(ClientError::Cancelled(CancelReason::Cancelled)),
            () = deadline => Err(ClientError::Cancelled(CancelReason::DeadlineExceeded)),
            output = future => Ok(output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_returns_output_when_not_cancelled() {
        let ctx = RequestContext::new();
        let output = ctx.run(async { 42 }).await.unwrap();
        assert_eq!(output, 42);
    }

    #[tokio::test]
    async fn test_cancelled_context_fails_before_running() {
        let ctx = RequestContext::new();
        ctx.cancel();

        let result = ctx.run(async { 42 }).await;
        assert!(matches!(
            result,
            Err(ClientError::Cancelled(CancelReason::Cancelled))
        ));
    }

    #[tokio::test]
    async fn test_clone_shares_cancellation() {
        let ctx = RequestContext::new();
        let handle = ctx.clone();
        handle.cancel();

        assert!(ctx.check().is_err());
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pending_future() {
        let ctx = RequestContext::new();
        let handle = ctx.clone();

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.cancel();
        });

        let result = ctx.run(std::future::pending::<()>()).await;
        assert!(matches!(
            result,
            Err(ClientError::Cancelled(CancelReason::Cancelled))
        ));
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn test_deadline_interrupts_pending_future() {
        let ctx = RequestContext::with_timeout(Duration::from_millis(20));

        let result = ctx.run(std::future::pending::<()>()).await;
        assert!(matches!(
            result,
            Err(ClientError::Cancelled(CancelReason::DeadlineExceeded))
        ));
    }

    #[tokio::test]
    async fn test_deadline_keeps_earliest() {
        let now = Instant::now();
        let ctx = RequestContext::new()
            .deadline(now + Duration::from_secs(10))
            .deadline(now + Duration::from_secs(1))
            .deadline(now + Duration::from_secs(30));

        assert_eq!(ctx.deadline_at(), Some(now + Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn test_check_reports_expired_deadline() {
        let ctx = RequestContext::new().deadline(Instant::now());
        assert!(matches!(
            ctx.check(),
            Err(ClientError::Cancelled(CancelReason::DeadlineExceeded))
        ));
    }
}
