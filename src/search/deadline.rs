//! Caller deadline and cancellation token

use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// A deadline shared by every task working on one search
///
/// Expires when its instant passes or when its token is cancelled,
/// whichever happens first.
#[derive(Debug, Clone)]
pub struct Deadline {
    at: Option<Instant>,
    token: CancellationToken,
}

impl Deadline {
    /// Deadline that expires `timeout` from now
    pub fn after(timeout: Duration) -> Self {
        Self::at(Instant::now() + timeout)
    }

    /// Deadline that expires at an absolute instant
    pub fn at(at: Instant) -> Self {
        Self {
            at: Some(at),
            token: CancellationToken::new(),
        }
    }

    /// Deadline that only expires when cancelled
    pub fn never() -> Self {
        Self {
            at: None,
            token: CancellationToken::new(),
        }
    }

    /// Tie this deadline to an externally owned token
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Cancel every task observing this deadline
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Whether the deadline has already passed or been cancelled
    pub fn is_expired(&self) -> bool {
        self.token.is_cancelled() || self.at.is_some_and(|at| Instant::now() >= at)
    }

    /// Time left before expiry, `None` for an open-ended deadline
    pub fn remaining(&self) -> Option<Duration> {
        if self.token.is_cancelled() {
            return Some(Duration::ZERO);
        }
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Resolves once the deadline expires
    pub async fn expired(&self) {
        match self.at {
            Some(at) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = sleep_until(at) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::never()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires_after_timeout() {
        let deadline = Deadline::after(Duration::from_millis(100));
        assert!(!deadline.is_expired());

        deadline.expired().await;
        assert!(deadline.is_expired());
        assert_eq!(deadline.remaining(), Some(Duration::ZERO));
    }

    #[tokio::test]
    async fn test_cancel_expires_immediately() {
        let deadline = Deadline::never();
        assert_eq!(deadline.remaining(), None);

        let observer = deadline.clone();
        deadline.cancel();
        observer.expired().await;
        assert!(observer.is_expired());
    }

    #[tokio::test]
    async fn test_external_token() {
        let token = CancellationToken::new();
        let deadline = Deadline::after(Duration::from_secs(60)).with_token(token.clone());
        token.cancel();
        assert!(deadline.is_expired());
    }
}
