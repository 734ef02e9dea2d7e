// Rotating credential pool for the rate-limited generation API.
//
// Gemini free-tier quotas apply per key, so Ember spreads calls across a
// pool of keys. Keys are handed out round-robin; a key that reports
// overload is quarantined for a cooldown window and re-admitted to the
// tail of the rotation once the window passes.
//
// The pool is designed to be shared across all concurrent tasks via
// Arc<KeyPool>, using interior mutability (Mutex) so callers only need
// a &self reference. The pool is shared-use, not exclusive-checkout:
// two workers may hold the same key at once, but available/cooldown
// transitions happen under a single lock so a quarantine is never lost.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use tokio::time::Instant;
use tracing::{info, warn};

/// An opaque credential for the generation API.
///
/// The raw string is only reachable through [`ApiKey::expose`], which the
/// HTTP client uses for request signing. Display and Debug redact all but
/// the last four characters so keys can't leak into logs or reports.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw credential. For request signing only — never log this.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chars: Vec<char> = self.0.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        write!(f, "****{tail}")
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({self})")
    }
}

/// Default cooldown applied when a key reports overload.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Default bound on how long `acquire` will wait for a key to exit cooldown.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(120);

/// Small buffer added when sleeping until a cooldown expiry, so the sweep
/// on the next pass sees the key as expired.
const EXPIRY_BUFFER: Duration = Duration::from_millis(50);

/// A rotating pool of API credentials with per-key cooldowns.
///
/// Invariant: a key lives in exactly one of the available queue or the
/// cooldown registry at any time. Keys are never dropped from the pool —
/// a quarantined key always comes back once its cooldown passes.
pub struct KeyPool {
    inner: Mutex<PoolInner>,
    /// Cooldown applied by [`KeyPool::quarantine`].
    cooldown: Duration,
    /// Upper bound on the total time `acquire` may spend waiting for a
    /// cooldown to expire before giving up.
    max_wait: Duration,
}

struct PoolInner {
    /// Round-robin rotation. Front is next to be handed out.
    available: VecDeque<ApiKey>,
    /// Quarantined keys and the instant they become eligible again.
    cooling: HashMap<ApiKey, Instant>,
}

impl KeyPool {
    /// Build a pool from raw credential strings.
    pub fn new<I, S>(keys: I, cooldown: Duration, max_wait: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let available: VecDeque<ApiKey> = keys.into_iter().map(ApiKey::new).collect();
        Self {
            inner: Mutex::new(PoolInner {
                available,
                cooling: HashMap::new(),
            }),
            cooldown,
            max_wait,
        }
    }

    /// Total number of keys in the pool (available + cooling).
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.available.len() + inner.cooling.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of keys currently in rotation.
    pub fn available_len(&self) -> usize {
        self.inner.lock().unwrap().available.len()
    }

    /// Number of keys currently quarantined.
    pub fn cooling_len(&self) -> usize {
        self.inner.lock().unwrap().cooling.len()
    }

    /// Hand out the next key in round-robin order.
    ///
    /// Every call first sweeps expired cooldowns back into rotation. The
    /// key is returned to the tail of the queue immediately (shared-use
    /// rotation), so consecutive calls walk the whole pool before any key
    /// repeats.
    ///
    /// When every key is cooling down, sleeps until the earliest expiry
    /// and retries. The total wait is bounded by the pool's `max_wait`;
    /// exceeding it is an error so a fully quarantined pool stalls the
    /// request instead of hanging the process forever.
    pub async fn acquire(&self) -> Result<ApiKey> {
        let deadline = Instant::now() + self.max_wait;

        loop {
            // Compute what to do while holding the lock, then drop it
            // before any await points.
            let wait = {
                let mut inner = self.inner.lock().unwrap();
                sweep(&mut inner);

                if let Some(key) = inner.available.pop_front() {
                    inner.available.push_back(key.clone());
                    return Ok(key);
                }

                let Some(earliest) = inner.cooling.values().min().copied() else {
                    anyhow::bail!("key pool has no credentials configured");
                };
                earliest.saturating_duration_since(Instant::now()) + EXPIRY_BUFFER
            };

            if Instant::now() + wait > deadline {
                anyhow::bail!(
                    "all {} keys are cooling down and the earliest expiry is past the {:?} wait limit",
                    self.len(),
                    self.max_wait,
                );
            }

            warn!(
                delay_ms = wait.as_millis() as u64,
                "All keys cooling down, waiting for earliest expiry"
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Return a key to the tail of the rotation.
    ///
    /// Rotation is shared-use rather than exclusive-checkout, so a key
    /// handed out by `acquire` is normally still in the queue and this is
    /// a no-op. A key in cooldown stays there.
    pub fn release_success(&self, key: &ApiKey) {
        let mut inner = self.inner.lock().unwrap();
        if inner.cooling.contains_key(key) || inner.available.contains(key) {
            return;
        }
        inner.available.push_back(key.clone());
    }

    /// Quarantine a key for the pool's default cooldown.
    pub fn quarantine(&self, key: &ApiKey) {
        self.quarantine_for(key, self.cooldown);
    }

    /// Quarantine a key until `cooldown` from now.
    ///
    /// Quarantining a key that is already cooling down refreshes its
    /// timer to the new expiry (last write wins).
    pub fn quarantine_for(&self, key: &ApiKey, cooldown: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.available.retain(|k| k != key);
        inner.cooling.insert(key.clone(), Instant::now() + cooldown);
        warn!(
            key = %key,
            cooldown_secs = cooldown.as_secs(),
            "Key quarantined after overload"
        );
    }
}

/// Move keys whose cooldown has expired back to the tail of the rotation.
fn sweep(inner: &mut PoolInner) {
    let now = Instant::now();
    let expired: Vec<ApiKey> = inner
        .cooling
        .iter()
        .filter(|(_, eligible_at)| **eligible_at <= now)
        .map(|(key, _)| key.clone())
        .collect();

    for key in expired {
        inner.cooling.remove(&key);
        inner.available.push_back(key.clone());
        info!(key = %key, "Key re-admitted after cooldown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn pool_of(n: usize) -> KeyPool {
        KeyPool::new(
            (0..n).map(|i| format!("test-key-{i:04}")),
            Duration::from_secs(60),
            Duration::from_secs(300),
        )
    }

    // ── ApiKey redaction ────────────────────────────────────────────

    #[test]
    fn test_display_redacts_all_but_tail() {
        let key = ApiKey::new("AIzaSyExampleCredential1234");
        assert_eq!(key.to_string(), "****1234");
        assert_eq!(format!("{key:?}"), "ApiKey(****1234)");
    }

    #[test]
    fn test_display_short_key() {
        let key = ApiKey::new("ab");
        assert_eq!(key.to_string(), "****ab");
    }

    #[test]
    fn test_expose_returns_raw_credential() {
        let key = ApiKey::new("secret");
        assert_eq!(key.expose(), "secret");
    }

    // ── Round-robin rotation ────────────────────────────────────────

    #[tokio::test]
    async fn test_acquire_round_robin_visits_every_key_once() {
        let pool = pool_of(5);
        let mut seen = std::collections::HashSet::new();

        for _ in 0..5 {
            let key = pool.acquire().await.unwrap();
            assert!(seen.insert(key), "key repeated before full rotation");
        }

        // The sixth acquire wraps around to the first key again
        let key = pool.acquire().await.unwrap();
        assert!(seen.contains(&key));
    }

    #[tokio::test]
    async fn test_acquire_preserves_configured_order() {
        let pool = KeyPool::new(
            ["alpha", "beta", "gamma"],
            Duration::from_secs(60),
            Duration::from_secs(60),
        );
        assert_eq!(pool.acquire().await.unwrap().expose(), "alpha");
        assert_eq!(pool.acquire().await.unwrap().expose(), "beta");
        assert_eq!(pool.acquire().await.unwrap().expose(), "gamma");
        assert_eq!(pool.acquire().await.unwrap().expose(), "alpha");
    }

    #[tokio::test]
    async fn test_acquire_empty_pool_errors() {
        let pool = KeyPool::new(
            Vec::<String>::new(),
            Duration::from_secs(60),
            Duration::from_secs(60),
        );
        let err = pool.acquire().await.unwrap_err();
        assert!(err.to_string().contains("no credentials"));
    }

    // ── Quarantine & cooldown ───────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_quarantined_key_excluded_until_expiry() {
        let pool = pool_of(3);
        let victim = pool.acquire().await.unwrap();
        pool.quarantine_for(&victim, Duration::from_secs(1));

        // Two keys remain in rotation; neither is the victim
        for _ in 0..4 {
            let key = pool.acquire().await.unwrap();
            assert_ne!(key, victim);
        }
        assert_eq!(pool.available_len(), 2);
        assert_eq!(pool.cooling_len(), 1);

        // After the cooldown passes, the victim rejoins at the tail
        tokio::time::advance(Duration::from_millis(1100)).await;
        let mut seen = std::collections::HashSet::new();
        for _ in 0..3 {
            seen.insert(pool.acquire().await.unwrap());
        }
        assert!(seen.contains(&victim));
        assert_eq!(pool.cooling_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_requarantine_refreshes_to_later_expiry() {
        let pool = pool_of(2);
        let victim = pool.acquire().await.unwrap();

        pool.quarantine_for(&victim, Duration::from_secs(1));
        tokio::time::advance(Duration::from_millis(500)).await;
        // Refresh before the first expiry: last write wins
        pool.quarantine_for(&victim, Duration::from_secs(2));

        // The original expiry passes but the key must stay quarantined
        tokio::time::advance(Duration::from_millis(1000)).await;
        let key = pool.acquire().await.unwrap();
        assert_ne!(key, victim);
        assert_eq!(pool.cooling_len(), 1);

        // The refreshed expiry passes
        tokio::time::advance(Duration::from_millis(1100)).await;
        let _ = pool.acquire().await.unwrap();
        assert_eq!(pool.cooling_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quarantine_key_not_in_available_set() {
        let pool = pool_of(2);
        let outsider = ApiKey::new("not-in-pool");
        pool.quarantine_for(&outsider, Duration::from_secs(1));

        // The outsider lands in the registry and eventually joins rotation
        assert_eq!(pool.cooling_len(), 1);
        tokio::time::advance(Duration::from_millis(1100)).await;
        let _ = pool.acquire().await.unwrap();
        assert_eq!(pool.available_len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_blocks_until_earliest_cooldown() {
        let pool = pool_of(2);
        let a = pool.acquire().await.unwrap();
        let b = pool.acquire().await.unwrap();
        pool.quarantine_for(&a, Duration::from_secs(5));
        pool.quarantine_for(&b, Duration::from_secs(2));

        // Nothing available; acquire should sleep until b's expiry (~2s)
        let start = Instant::now();
        let key = pool.acquire().await.unwrap();
        let waited = start.elapsed();

        assert_eq!(key, b, "earliest-expiring key should come back first");
        assert!(
            waited >= Duration::from_secs(2) && waited < Duration::from_secs(3),
            "expected ~2s wait, got {waited:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_fails_past_max_wait() {
        let pool = KeyPool::new(
            ["only"],
            Duration::from_secs(60),
            Duration::from_secs(10),
        );
        let key = pool.acquire().await.unwrap();
        pool.quarantine_for(&key, Duration::from_secs(3600));

        let err = pool.acquire().await.unwrap_err();
        assert!(err.to_string().contains("wait limit"), "got: {err}");
    }

    // ── release_success ─────────────────────────────────────────────

    #[tokio::test]
    async fn test_release_success_is_noop_for_rotating_key() {
        let pool = pool_of(3);
        let key = pool.acquire().await.unwrap();
        pool.release_success(&key);
        assert_eq!(pool.available_len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_success_does_not_unquarantine() {
        let pool = pool_of(3);
        let key = pool.acquire().await.unwrap();
        pool.quarantine_for(&key, Duration::from_secs(30));
        pool.release_success(&key);
        assert_eq!(pool.available_len(), 2);
        assert_eq!(pool.cooling_len(), 1);
    }

    // ── Concurrency ─────────────────────────────────────────────────

    #[tokio::test]
    async fn test_concurrent_acquires_share_pool() {
        let pool = Arc::new(pool_of(4));
        let mut handles = Vec::new();

        for _ in 0..16 {
            let pool = Arc::clone(&pool);
            handles.push(tokio::spawn(async move { pool.acquire().await.unwrap() }));
        }

        for h in handles {
            h.await.unwrap();
        }

        // Shared-use rotation never loses keys
        assert_eq!(pool.len(), 4);
        assert_eq!(pool.available_len(), 4);
    }

    #[tokio::test]
    async fn test_concurrent_quarantine_never_lost() {
        let pool = Arc::new(pool_of(8));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let pool = Arc::clone(&pool);
            handles.push(tokio::spawn(async move {
                let key = pool.acquire().await.unwrap();
                pool.quarantine_for(&key, Duration::from_secs(600));
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        // Every quarantined key is accounted for; none double-counted
        assert_eq!(pool.available_len() + pool.cooling_len(), 8);
        assert!(pool.cooling_len() >= 1);
    }
}
