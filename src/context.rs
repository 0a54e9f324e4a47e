//! Execution context carrying a deadline and cancellation.
//!
//! Every I/O-bearing cache operation takes a [`Context`]. The facade runs each
//! backend call through [`Context::run`], which races it against the deadline
//! and the cancellation signal and drops the in-flight call when either fires.
//!
//! ```
//! use resource_cache::context::Context;
//! use std::time::Duration;
//!
//! // No deadline, never cancelled
//! let _ctx = Context::background();
//!
//! // Abort backend calls after 250ms
//! let _ctx = Context::background().with_timeout(Duration::from_millis(250));
//!
//! // Cancel on demand; children inherit the parent's signals
//! let (ctx, handle) = Context::background().with_cancel();
//! handle.cancel();
//! assert!(ctx.is_cancelled());
//! ```

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Deadline and cancellation scope for cache operations.
///
/// Cheap to clone. Derived contexts keep the earlier deadline and every
/// cancellation signal of their parent.
#[derive(Clone, Debug, Default)]
pub struct Context {
    deadline: Option<Instant>,
    signals: Vec<watch::Receiver<bool>>,
}

/// Cancels the [`Context`] it was created with, and all contexts derived from it.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Context {
    /// Context with no deadline that is never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context whose deadline is at most `timeout` from now.
    ///
    /// A timeout too large to represent as an instant adds no deadline.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.clone(),
        }
    }

    /// Derive a context with the given deadline, keeping the parent's if earlier.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing <= deadline => existing,
            _ => deadline,
        };
        Context {
            deadline: Some(deadline),
            signals: self.signals.clone(),
        }
    }

    /// Derive a cancellable context.
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let mut signals = self.signals.clone();
        signals.push(rx);
        (
            Context {
                deadline: self.deadline,
                signals,
            },
            CancelHandle { tx },
        )
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.signals.iter().any(|rx| *rx.borrow())
    }

    /// Fail fast if the context is already cancelled or past its deadline.
    ///
    /// # Errors
    /// - `Error::Cancelled` if any cancellation signal fired
    /// - `Error::Timeout` if the deadline has passed
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Error::Timeout("context deadline exceeded".to_string()));
        }
        Ok(())
    }

    /// Resolves once any cancellation signal fires. Never resolves otherwise.
    pub async fn cancelled(&self) {
        if self.signals.is_empty() {
            std::future::pending::<()>().await;
        }

        let waits = self
            .signals
            .iter()
            .cloned()
            .map(|rx| Box::pin(wait_cancelled(rx)));
        futures::future::select_all(waits).await;
    }

    /// Run `fut` within this context.
    ///
    /// The future is dropped, and thereby aborted, when the deadline passes or
    /// the context is cancelled.
    ///
    /// # Errors
    /// - `Error::Timeout` when the deadline passes first
    /// - `Error::Cancelled` when cancelled first
    /// - Whatever `fut` itself returns
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;

        let deadline = async {
            match self.deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            res = fut => res,
            _ = deadline => {
                debug!("Context deadline exceeded, aborting backend call");
                Err(Error::Timeout("context deadline exceeded".to_string()))
            }
            _ = self.cancelled() => {
                debug!("Context cancelled, aborting backend call");
                Err(Error::Cancelled)
            }
        }
    }
}

async fn wait_cancelled(mut rx: watch::Receiver<bool>) {
    // A dropped handle that never cancelled leaves the context live.
    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_background_runs_to_completion() {
        let ctx = Context::background();
        let value = ctx.run(async { Ok(7) }).await.expect("run should succeed");
        assert_eq!(value, 7);
        assert!(ctx.deadline().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_aborts_slow_call() {
        let ctx = Context::background().with_timeout(Duration::from_millis(50));
        let result: Result<()> = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(Error::Timeout(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_context_fails_before_io() {
        let ctx = Context::background().with_timeout(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(matches!(ctx.check(), Err(Error::Timeout(_))));
    }

    #[tokio::test]
    async fn test_cancel_aborts_in_flight_call() {
        let (ctx, handle) = Context::background().with_cancel();

        let (result, _) = tokio::join!(
            ctx.run(async {
                std::future::pending::<()>().await;
                Ok(())
            }),
            async {
                tokio::task::yield_now().await;
                handle.cancel();
            }
        );

        assert_eq!(result, Err(Error::Cancelled));
    }

    #[tokio::test]
    async fn test_child_inherits_parent_cancellation() {
        let (parent, handle) = Context::background().with_cancel();
        let child = parent.with_timeout(Duration::from_secs(60));
        let (grandchild, _own) = child.with_cancel();

        handle.cancel();
        assert!(child.is_cancelled());
        assert_eq!(grandchild.check(), Err(Error::Cancelled));
    }

    #[tokio::test]
    async fn test_dropped_handle_does_not_cancel() {
        let (ctx, handle) = Context::background().with_cancel();
        drop(handle);
        assert!(!ctx.is_cancelled());
        assert_eq!(ctx.run(async { Ok(1) }).await, Ok(1));
    }

    #[tokio::test]
    async fn test_unrepresentable_timeout_means_no_deadline() {
        let ctx = Context::background().with_timeout(Duration::MAX);
        assert!(ctx.deadline().is_none());
        assert_eq!(ctx.run(async { Ok(3) }).await, Ok(3));

        let bounded = Context::background().with_timeout(Duration::from_secs(5));
        let child = bounded.with_timeout(Duration::MAX);
        assert_eq!(child.deadline(), bounded.deadline());
    }

    #[tokio::test]
    async fn test_with_deadline_keeps_earlier() {
        let now = Instant::now();
        let early = Context::background().with_deadline(now + Duration::from_secs(1));
        let derived = early.with_deadline(now + Duration::from_secs(30));
        assert_eq!(derived.deadline(), Some(now + Duration::from_secs(1)));
    }
}
