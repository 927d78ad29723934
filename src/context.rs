use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::database::error::{CancelCause, RepositoryError};

/// Cancellation and deadline scope handed to every repository and credential call.
///
/// A context is checked once at entry (an already-finished context never
/// reaches storage) and then raced against the in-flight operation so that a
/// deadline firing mid-call aborts it instead of hanging.
#[derive(Debug, Clone)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// Context with no deadline that is only cancelled explicitly.
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Derive a child that is cancelled with its parent and whose deadline is
    /// the earlier of the parent's and `now + timeout`.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) if parent < candidate => parent,
            _ => candidate,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail fast when the context has already been cancelled or has expired.
    pub fn check(&self) -> Result<(), RepositoryError> {
        if self.token.is_cancelled() {
            return Err(RepositoryError::Canceled(CancelCause::Canceled));
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(RepositoryError::Canceled(CancelCause::DeadlineExceeded));
            }
        }
        Ok(())
    }

    /// Run `op` inside this context.
    ///
    /// `op` is not polled at all when the context is already done, so lazy
    /// futures (async blocks) perform no work in that case.
    pub async fn run<F, T>(&self, op: F) -> Result<T, RepositoryError>
    where
        F: Future<Output = Result<T, RepositoryError>>,
    {
        self.check()?;

        let deadline = self.deadline;
        let expiry = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(RepositoryError::Canceled(CancelCause::Canceled)),
            _ = expiry => Err(RepositoryError::Canceled(CancelCause::DeadlineExceeded)),
            result = op => result,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}
