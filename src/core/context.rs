use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use super::TallyError;

/// Per-request bound on outbound store calls.
///
/// A call run through [`RequestContext::run`] is dropped as soon as the
/// token is cancelled or the deadline passes, and the matching error is
/// returned instead of the call's own result.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl RequestContext {
    /// No deadline, never cancelled unless the token is fired.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: CancellationToken::new(),
        }
    }

    /// Replaces the cancellation token, keeping the deadline.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub async fn run<F, T>(&self, call: F) -> Result<T, TallyError>
    where
        F: Future<Output = Result<T, TallyError>>,
    {
        let deadline = async {
            match self.deadline {
                Some(at) => sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(TallyError::Cancelled),
            _ = deadline => Err(TallyError::DeadlineExceeded),
            result = call => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_passes_result_through() {
        let ctx = RequestContext::with_timeout(Duration::from_secs(5));
        assert_eq!(ctx.run(async { Ok::<_, TallyError>(7) }).await, Ok(7));

        let failed = ctx
            .run(async { Err::<(), _>(TallyError::StorageUnavailable("down".into())) })
            .await;
        assert_eq!(failed, Err(TallyError::StorageUnavailable("down".into())));
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let ctx = RequestContext::with_timeout(Duration::from_millis(20));
        let result = ctx
            .run(std::future::pending::<Result<(), TallyError>>())
            .await;
        assert_eq!(result, Err(TallyError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_cancelled() {
        let token = CancellationToken::new();
        let ctx = RequestContext::background().with_cancellation(token.clone());
        token.cancel();
        let result = ctx
            .run(std::future::pending::<Result<(), TallyError>>())
            .await;
        assert_eq!(result, Err(TallyError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancel_wins_over_expired_deadline() {
        let ctx = RequestContext::with_deadline(Instant::now());
        ctx.cancellation_token().cancel();
        let result = ctx.run(async { Ok::<_, TallyError>(()) }).await;
        assert_eq!(result, Err(TallyError::Cancelled));
    }
}
