//! Retry policy for remote calls.
//!
//! The policy only reports how an operation ended. Deciding what that means for
//! the connection mode is the caller's job.

use crate::infra::remote::{RemoteError, RemoteErrorKind, RemoteResult};
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

#[derive(Debug)]
pub enum RetryOutcome<T> {
    Success(T),
    /// The remote table does not exist; never retried.
    TableMissing(RemoteError),
    /// The remote answered definitively (e.g. row not found); never retried.
    Rejected(RemoteError),
    /// Every retry failed.
    Exhausted(RemoteError),
    /// The guard reported the remote is no longer usable before retries ran out.
    Abandoned(RemoteError),
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Linear backoff: the first retry waits one unit, the last waits `max_retries` units.
    pub fn delay_for(&self, retries_left: u32) -> Duration {
        let step = self.max_retries.saturating_sub(retries_left) + 1;
        self.base_delay * step
    }

    /// Runs `op` once, then up to `max_retries` more times on transient errors.
    ///
    /// `may_continue` is consulted before every retry; once it returns false the
    /// loop stops with `Abandoned`.
    pub async fn run<T, F, Fut, G>(&self, mut op: F, mut may_continue: G) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RemoteResult<T>>,
        G: FnMut() -> bool,
    {
        let mut retries_left = self.max_retries;
        loop {
            let err = match op().await {
                Ok(value) => return RetryOutcome::Success(value),
                Err(err) => err,
            };

            match err.kind {
                RemoteErrorKind::TableMissing => return RetryOutcome::TableMissing(err),
                RemoteErrorKind::NotFound => return RetryOutcome::Rejected(err),
                RemoteErrorKind::Transient => {}
            }

            if retries_left == 0 {
                return RetryOutcome::Exhausted(err);
            }
            if !may_continue() {
                return RetryOutcome::Abandoned(err);
            }

            let delay = self.delay_for(retries_left);
            tracing::debug!(
                retries_left,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "remote call failed, retrying"
            );
            tokio::time::sleep(delay).await;
            retries_left -= 1;

            // The mode may have been demoted by another operation while we slept.
            if !may_continue() {
                return RetryOutcome::Abandoned(err);
            }
        }
    }
}
