//! Cooperative cancellation and request deadlines.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::RetrievalError;

/// Cooperative cancellation token wrapping a shared `AtomicBool`.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

/// Returned by [`Deadline::check`] once the deadline has passed or was cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadlineExceeded {
    pub stage: String,
}

impl std::fmt::Display for DeadlineExceeded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "deadline exceeded during {}", self.stage)
    }
}

impl std::error::Error for DeadlineExceeded {}

impl From<DeadlineExceeded> for RetrievalError {
    fn from(err: DeadlineExceeded) -> Self {
        RetrievalError::DeadlineExceeded { stage: err.stage }
    }
}

/// A soft per-request deadline shared by every stage.
///
/// Cloning shares the cancellation token, so cancelling any clone stops all of them.
#[derive(Debug, Clone, Default)]
pub struct Deadline {
    expires_at: Option<Instant>,
    token: CancellationToken,
}

impl Deadline {
    /// No time limit; only explicit cancellation stops work.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn after(budget: Duration) -> Self {
        Self {
            expires_at: Instant::now().checked_add(budget),
            token: CancellationToken::new(),
        }
    }

    /// `0` means no deadline.
    pub fn from_millis(ms: u64) -> Self {
        if ms == 0 {
            Self::none()
        } else {
            Self::after(Duration::from_millis(ms))
        }
    }

    /// A child deadline that expires at the earlier of `self` and `now + budget`.
    pub fn child(&self, budget: Duration) -> Self {
        let candidate = Instant::now().checked_add(budget);
        let expires_at = match (self.expires_at, candidate) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self {
            expires_at,
            token: self.token.clone(),
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_expired(&self) -> bool {
        self.token.is_cancelled()
            || self
                .expires_at
                .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Time left, or `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        if self.token.is_cancelled() {
            return Some(Duration::ZERO);
        }
        self.expires_at
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn check(&self, stage: &str) -> Result<(), DeadlineExceeded> {
        if self.is_expired() {
            Err(DeadlineExceeded {
                stage: stage.to_string(),
            })
        } else {
            Ok(())
        }
    }
}
