//! Transport-level retries for model calls.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::future::Future;
use std::time::Duration;
use tessera_core::{Message, RawResponse};
use tessera_error::{TesseraError, TesseraErrorKind, TesseraResult};
use tessera_interface::{ModelClient, PromptOptions};
use tokio_retry2::strategy::{ExponentialBackoff, jitter};
use tokio_retry2::{Retry, RetryError};
use tracing::{info, warn};

/// Overrides for the error-specific retry strategy.
///
/// Without overrides, backoff and retry count come from the first error: rate limits
/// back off longer than server errors.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    derive_getters::Getters,
    derive_setters::Setters,
)]
#[setters(prefix = "with_", strip_option)]
pub struct RetryPolicy {
    /// Maximum retries after the first failure
    max_retries: Option<usize>,
    /// Initial backoff in milliseconds
    initial_backoff_ms: Option<u64>,
    /// Disable retries entirely
    no_retry: bool,
}

/// Model client decorator that repeats transiently failed calls with exponential
/// backoff and jitter. Permanent errors fail immediately.
///
/// Validation failures are not transport errors; those are retried by the
/// generation strategy with corrective feedback.
pub struct RetryingClient<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C> std::fmt::Debug for RetryingClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingClient")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// `(initial_backoff_ms, max_retries, max_delay_secs)` for a transient error.
fn strategy_params(err: &TesseraError) -> (u64, usize, u64) {
    match err.kind() {
        TesseraErrorKind::Model(e) => e.kind.retry_strategy_params(),
        _ => (1000, 3, 10),
    }
}

impl<C: ModelClient> RetryingClient<C> {
    /// Wrap `inner` with retries.
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// The wrapped client.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    async fn with_retries<T, F, Fut>(&self, method: &'static str, call: F) -> TesseraResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = TesseraResult<T>>,
    {
        // Try once to learn the error-specific strategy
        let first = match call().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if self.policy.no_retry || !first.is_retryable() {
            warn!(method, error = %first, "Permanent model error, failing immediately");
            return Err(first);
        }

        let (mut initial_ms, mut max_retries, max_delay_secs) = strategy_params(&first);
        if let Some(backoff) = self.policy.initial_backoff_ms {
            initial_ms = backoff;
        }
        if let Some(retries) = self.policy.max_retries {
            max_retries = retries;
        }
        if max_retries == 0 {
            return Err(first);
        }

        info!(
            method,
            error = %first,
            initial_backoff_ms = initial_ms,
            max_retries,
            max_delay_secs,
            "Model call failed, will retry with configured strategy"
        );

        let mut delays = ExponentialBackoff::from_millis(initial_ms)
            .factor(2)
            .max_delay(Duration::from_secs(max_delay_secs))
            .map(jitter)
            .take(max_retries);

        // The probe above was the first attempt; wait before handing over
        if let Some(delay) = delays.next() {
            tokio::time::sleep(delay).await;
        }

        Retry::spawn(delays, || async {
            match call().await {
                Ok(value) => Ok(value),
                Err(e) if e.is_retryable() => {
                    warn!(method, error = %e, "Model call failed, will retry");
                    Err(RetryError::Transient {
                        err: e,
                        retry_after: None,
                    })
                }
                Err(e) => {
                    warn!(method, error = %e, "Permanent model error, failing immediately");
                    Err(RetryError::Permanent(e))
                }
            }
        })
        .await
    }
}

#[async_trait]
impl<C: ModelClient> ModelClient for RetryingClient<C> {
    async fn prompt_structured(
        &self,
        messages: &[Message],
        schema: &JsonValue,
        options: &PromptOptions,
    ) -> TesseraResult<JsonValue> {
        self.with_retries("structured", || {
            self.inner.prompt_structured(messages, schema, options)
        })
        .await
    }

    async fn prompt_text(
        &self,
        messages: &[Message],
        options: &PromptOptions,
    ) -> TesseraResult<String> {
        self.with_retries("text", || self.inner.prompt_text(messages, options))
            .await
    }

    async fn prompt_raw(
        &self,
        messages: &[Message],
        options: &PromptOptions,
    ) -> TesseraResult<RawResponse> {
        self.with_retries("raw", || self.inner.prompt_raw(messages, options))
            .await
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}
