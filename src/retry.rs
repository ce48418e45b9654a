//! Bounded retry for section generation
//!
//! Wraps one section-generation operation with a fixed attempt budget and a
//! fixed delay between attempts. Persistent failure becomes a failure
//! sentinel, never an error: one section's irrecoverable failure must not
//! abort generation of the remaining sections.

use crate::models::{SectionKey, SectionOutcome};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Fixed delay between attempts. No exponential backoff, no jitter.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Zero-delay policy for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay: Duration::ZERO,
        }
    }
}

/// Invoke `op` up to `policy.max_attempts` times.
///
/// - First success returns immediately with the attempt count.
/// - Contract errors (caller defects) propagate unretried.
/// - Exhausting all attempts yields `SectionOutcome::Failed` carrying the
///   section's failure sentinel.
/// - Cancellation observed before an attempt yields `Cancelled` without
///   consuming attempts; retried attempts are not assumed idempotent.
pub async fn generate_with_retry<F, Fut>(
    policy: &RetryPolicy,
    section: SectionKey,
    cancel: &CancellationToken,
    op: F,
) -> crate::Result<SectionOutcome>
where
    F: Fn() -> Fut,
    Fut: Future<Output = crate::Result<String>>,
{
    let mut attempt: u32 = 0;

    while attempt < policy.max_attempts {
        if cancel.is_cancelled() {
            info!(section = %section, "Cancellation observed before attempt");
            return Ok(SectionOutcome::Cancelled);
        }

        attempt += 1;
        info!(section = %section, attempt, "Generating section");

        match op().await {
            Ok(text) => {
                info!(section = %section, attempt, "Section generated successfully");
                return Ok(SectionOutcome::Generated {
                    text,
                    attempts: attempt,
                });
            }
            Err(e) if e.is_contract_error() => {
                error!(section = %section, "Contract error, not retrying: {}", e);
                return Err(e);
            }
            Err(e) => {
                error!(section = %section, attempt, "Attempt failed: {}", e);
                if attempt < policy.max_attempts {
                    info!(
                        section = %section,
                        delay_ms = policy.delay.as_millis() as u64,
                        "Retrying section generation"
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            return Ok(SectionOutcome::Cancelled);
                        }
                        _ = tokio::time::sleep(policy.delay) => {}
                    }
                }
            }
        }
    }

    error!(
        section = %section,
        max_attempts = policy.max_attempts,
        "All attempts failed, marking section as failed"
    );

    Ok(SectionOutcome::Failed {
        sentinel: section.failure_sentinel(),
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_succeeds_after_two_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::immediate(3);
        let token = CancellationToken::new();

        let counter = calls.clone();
        let outcome = generate_with_retry(&policy, SectionKey::MarketOpportunity, &token, || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(ReportError::LlmError("rate limited".to_string()))
                } else {
                    Ok("market text".to_string())
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            outcome,
            SectionOutcome::Generated {
                text: "market text".to_string(),
                attempts: 3
            }
        );
    }

    #[tokio::test]
    async fn test_first_success_makes_one_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::immediate(3);
        let token = CancellationToken::new();

        let counter = calls.clone();
        let outcome = generate_with_retry(&policy, SectionKey::GoToMarket, &token, || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok("gtm text".to_string())
            }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.attempts(), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_sentinel_with_display_name() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::immediate(3);
        let token = CancellationToken::new();

        let counter = calls.clone();
        let outcome = generate_with_retry(&policy, SectionKey::LeadershipTeam, &token, || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ReportError::LlmError("backend down".to_string()))
            }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match outcome {
            SectionOutcome::Failed { sentinel, attempts } => {
                assert_eq!(attempts, 3);
                assert!(sentinel.contains("Leadership & Team"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_contract_error_propagates_unretried() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::immediate(3);
        let token = CancellationToken::new();

        let counter = calls.clone();
        let result = generate_with_retry(&policy, SectionKey::InvestorFit, &token, || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ReportError::MissingPlaceholder("retrieved_context".to_string()))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ReportError::MissingPlaceholder(_))));
    }

    #[tokio::test]
    async fn test_cancellation_returns_cancelled_without_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::immediate(3);
        let token = CancellationToken::new();
        token.cancel();

        let counter = calls.clone();
        let outcome = generate_with_retry(&policy, SectionKey::Recommendations, &token, || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok("unused".to_string())
            }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(outcome, SectionOutcome::Cancelled);
    }
}
