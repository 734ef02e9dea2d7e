// Retry, quarantine, and fallback policy for generation calls.
//
// A failure that looks like overload quarantines the key that was used,
// so the next attempt draws a fresh key from the rotation. Any other
// failure retries identically. Attempts back off exponentially with
// jitter. When the ceiling is exhausted the caller gets a deterministic
// fallback value instead of an error — generation never hard-fails a
// request, it only degrades it.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tracing::warn;

use crate::keys::{ApiKey, KeyPool};

/// Attempt ceiling and backoff curve for one logical generation call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles per attempt after that.
    pub base_backoff: Duration,
    /// Cap on the exponential growth.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

/// Check whether an error is a rate-limit/overload error.
///
/// The REST client surfaces HTTP status and body in its error messages,
/// so we check the error chain's Debug representation for the markers
/// Gemini uses: 429, RESOURCE_EXHAUSTED, "rate limit", or an overloaded
/// 503.
pub fn is_overload_error(err: &anyhow::Error) -> bool {
    let debug_str = format!("{err:?}").to_lowercase();
    debug_str.contains("429")
        || debug_str.contains("rate limit")
        || debug_str.contains("ratelimit")
        || debug_str.contains("resource_exhausted")
        || (debug_str.contains("503") && debug_str.contains("overloaded"))
}

/// Run a generation call with key rotation and quarantine-on-overload.
///
/// Each attempt acquires a key from the pool, so after a quarantine the
/// retry automatically lands on a different credential. Returns the last
/// error once the attempt ceiling is exhausted; most callers want
/// [`generate_or_fallback`] instead.
pub async fn generate_with_retry<T, F, Fut>(
    pool: &KeyPool,
    policy: &RetryPolicy,
    operation: F,
) -> Result<T>
where
    F: Fn(ApiKey) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;

    loop {
        let key = pool.acquire().await?;

        match operation(key.clone()).await {
            Ok(value) => {
                pool.release_success(&key);
                return Ok(value);
            }
            Err(err) => {
                if is_overload_error(&err) {
                    pool.quarantine(&key);
                }

                attempt += 1;
                if attempt >= policy.max_attempts {
                    return Err(err);
                }

                let backoff = backoff_delay(policy, attempt - 1);
                warn!(
                    attempt = attempt,
                    max_attempts = policy.max_attempts,
                    backoff_secs = backoff.as_secs_f64(),
                    error = %err,
                    "Generation attempt failed, retrying"
                );
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

/// Like [`generate_with_retry`], but an exhausted ceiling (or an exhausted
/// key pool) yields the deterministic fallback instead of an error.
pub async fn generate_or_fallback<T, F, Fut>(
    pool: &KeyPool,
    policy: &RetryPolicy,
    operation: F,
    fallback: impl FnOnce() -> T,
) -> T
where
    F: Fn(ApiKey) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match generate_with_retry(pool, policy, operation).await {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "Generation exhausted retries, using fallback");
            fallback()
        }
    }
}

/// Exponential backoff: base * 2^attempt, capped, then jittered.
///
/// Jitter scales the delay by 0.75–1.25 using the nanosecond component of
/// the current time — enough variation to avoid thundering herd without
/// pulling rand into the retry path.
fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let backoff = policy
        .base_backoff
        .saturating_mul(1u32 << attempt.min(16))
        .min(policy.max_backoff);

    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    let jitter_factor = 0.75 + (nanos % 500) as f64 / 1000.0;

    Duration::from_secs_f64(backoff.as_secs_f64() * jitter_factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn pool_of(n: usize) -> KeyPool {
        KeyPool::new(
            (0..n).map(|i| format!("retry-key-{i}")),
            Duration::from_secs(60),
            Duration::from_secs(5),
        )
    }

    // ── is_overload_error ───────────────────────────────────────────

    #[test]
    fn test_overload_markers_detected() {
        assert!(is_overload_error(&anyhow::anyhow!(
            "generateContent (m) returned 429 Too Many Requests: slow down"
        )));
        assert!(is_overload_error(&anyhow::anyhow!("rate limit exceeded")));
        assert!(is_overload_error(&anyhow::anyhow!(
            "returned 400: {{\"status\": \"RESOURCE_EXHAUSTED\"}}"
        )));
        assert!(is_overload_error(&anyhow::anyhow!(
            "returned 503 Service Unavailable: the model is overloaded"
        )));
    }

    #[test]
    fn test_plain_errors_not_overload() {
        assert!(!is_overload_error(&anyhow::anyhow!("connection refused")));
        assert!(!is_overload_error(&anyhow::anyhow!("returned 500: boom")));
        // A 503 without the overload marker is just an outage
        assert!(!is_overload_error(&anyhow::anyhow!("returned 503: nope")));
    }

    #[test]
    fn test_overload_detected_through_context_chain() {
        let inner = anyhow::anyhow!("HTTP 429");
        let outer = inner.context("counterpoint generation failed");
        assert!(is_overload_error(&outer));
    }

    // ── generate_with_retry ─────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let pool = pool_of(2);
        let calls = AtomicU32::new(0);

        let result = generate_with_retry(&pool, &RetryPolicy::default(), |_key| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, anyhow::Error>("text") }
        })
        .await;

        assert_eq!(result.unwrap(), "text");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(pool.cooling_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overload_quarantines_and_rotates() {
        let pool = pool_of(3);
        let calls = AtomicU32::new(0);

        let result = generate_with_retry(&pool, &RetryPolicy::default(), |key| {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(anyhow::anyhow!("returned 429: {key} is over quota"))
                } else {
                    Ok(key)
                }
            }
        })
        .await;

        // First key was quarantined; the retry drew a different one
        let key = result.unwrap();
        assert_eq!(pool.cooling_len(), 1);
        assert_ne!(key.expose(), "retry-key-0");
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_overload_errors_retry_without_quarantine() {
        let pool = pool_of(2);
        let calls = AtomicU32::new(0);

        let result = generate_with_retry(&pool, &RetryPolicy::default(), |_key| {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(anyhow::anyhow!("connection reset"))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(pool.cooling_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ceiling_exhausted_returns_last_error() {
        let pool = pool_of(2);
        let calls = AtomicU32::new(0);

        let result: Result<()> = generate_with_retry(&pool, &RetryPolicy::default(), |_key| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(anyhow::anyhow!("persistent failure")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 4); // default max_attempts
    }

    // ── generate_or_fallback ────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_fallback_after_exhausted_ceiling() {
        let pool = pool_of(1);

        let value = generate_or_fallback(
            &pool,
            &RetryPolicy::default(),
            |_key| async { Err::<String, _>(anyhow::anyhow!("nope")) },
            || "placeholder".to_string(),
        )
        .await;

        assert_eq!(value, "placeholder");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_when_pool_fully_quarantined() {
        let pool = KeyPool::new(["solo"], Duration::from_secs(3600), Duration::from_secs(1));
        let key = pool.acquire().await.unwrap();
        pool.quarantine(&key);

        let value = generate_or_fallback(
            &pool,
            &RetryPolicy::default(),
            |_key| async { Ok("never reached".to_string()) },
            || "placeholder".to_string(),
        )
        .await;

        assert_eq!(value, "placeholder");
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_skips_fallback() {
        let pool = pool_of(1);

        let value = generate_or_fallback(
            &pool,
            &RetryPolicy::default(),
            |_key| async { Ok("generated".to_string()) },
            || "placeholder".to_string(),
        )
        .await;

        assert_eq!(value, "generated");
    }

    // ── backoff_delay ───────────────────────────────────────────────

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        // Jitter is 0.75-1.25x, so check bounds rather than exact values
        let first = backoff_delay(&policy, 0);
        assert!(first >= Duration::from_millis(750) && first <= Duration::from_millis(1250));

        let third = backoff_delay(&policy, 2);
        assert!(third >= Duration::from_secs(3) && third <= Duration::from_secs(5));

        let huge = backoff_delay(&policy, 12);
        assert!(huge <= Duration::from_secs_f64(30.0 * 1.25));
    }
}
