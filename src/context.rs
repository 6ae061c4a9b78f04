use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::ContextError;

/// Cancellation and deadline carried into [`start`](crate::start) and
/// [`Shutdown::shutdown`](crate::Shutdown::shutdown).
///
/// A context is done once its token is cancelled or its deadline has passed.
/// Derived contexts share cancellation with their parent (cancelling the
/// parent cancels the child, not the other way round) and never extend the
/// parent's deadline.
///
/// ```
/// use std::time::Duration;
/// use obs_bootstrap::CallContext;
///
/// let ctx = CallContext::background().with_timeout(Duration::from_secs(2));
/// assert!(ctx.err().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context that is done after `timeout`, or earlier if `self` is.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            // Unrepresentable instant: effectively no deadline of our own.
            None => Self {
                token: self.token.child_token(),
                deadline: self.deadline,
            },
        }
    }

    /// Derive a context that is done at `deadline`, or earlier if `self` is.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Derive a cancellable context. Cancelling the returned token cancels
    /// the new context only.
    pub fn with_cancel(&self) -> (Self, CancellationToken) {
        let token = self.token.child_token();
        let ctx = Self {
            token: token.clone(),
            deadline: self.deadline,
        };
        (ctx, token)
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline. `None` means no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Why the context is done, or `None` while it is still live.
    ///
    /// Cancellation is reported before an expired deadline.
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Return `Err` if the context is done.
    pub fn check(&self) -> Result<(), ContextError> {
        match self.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
