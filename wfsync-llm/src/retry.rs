//! Retry with exponential backoff
//!
//! Attempts are folded into a [`RetryState`] that carries the attempt count,
//! the accumulated cost and the last error.

use crate::{LlmError, LlmResult};
use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;
use wfsync_core::SyncSettings;

/// What one attempt produced, and what it cost
#[derive(Debug)]
pub struct AttemptOutcome<T> {
    pub result: LlmResult<T>,
    pub cost: f64,
}

impl<T> AttemptOutcome<T> {
    pub const fn new(result: LlmResult<T>, cost: f64) -> Self {
        Self { result, cost }
    }
}

/// A successful value plus the attempts and cost it took
#[derive(Debug, Clone, PartialEq)]
pub struct Retried<T> {
    pub value: T,
    pub attempts: u32,
    pub total_cost: f64,
}

/// Accumulator of the retry fold
#[derive(Debug, Default)]
pub struct RetryState {
    pub attempts: u32,
    pub total_cost: f64,
    pub last_error: Option<LlmError>,
}

impl RetryState {
    /// Fold one outcome in: break with the value on success
    pub fn absorb<T>(self, outcome: AttemptOutcome<T>) -> ControlFlow<Retried<T>, Self> {
        let attempts = self.attempts + 1;
        let total_cost = self.total_cost + outcome.cost;
        match outcome.result {
            Ok(value) => ControlFlow::Break(Retried {
                value,
                attempts,
                total_cost,
            }),
            Err(e) => ControlFlow::Continue(Self {
                attempts,
                total_cost,
                last_error: Some(e),
            }),
        }
    }
}

/// Attempt count and backoff base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub const fn from_settings(settings: &SyncSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            base_delay: settings.base_delay(),
        }
    }

    /// Wait after the zero-based attempt `attempt` failed
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `operation` until it succeeds or the attempts are used up.
    ///
    /// On exhaustion the last error is returned unchanged.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> LlmResult<Retried<T>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = AttemptOutcome<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut state = RetryState::default();

        loop {
            let attempt = state.attempts;
            state = match state.absorb(operation(attempt).await) {
                ControlFlow::Break(done) => return Ok(done),
                ControlFlow::Continue(state) => state,
            };

            if let Some(err) = &state.last_error {
                tracing::error!(
                    "LLM call failed (attempt {}/{max_attempts}): {err}",
                    attempt + 1
                );
            }
            if state.attempts >= max_attempts {
                break;
            }

            let wait = self.delay_for(attempt);
            tracing::info!("Retrying in {}ms...", wait.as_millis());
            tokio::time::sleep(wait).await;
        }

        tracing::error!(
            "All retry attempts exhausted. Total cost incurred: ${:.4}",
            state.total_cost
        );
        Err(state
            .last_error
            .unwrap_or_else(|| LlmError::Config("retry finished without an attempt".to_string())))
    }
}
