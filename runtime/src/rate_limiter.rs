//! Sliding-window rate limiter.
//!
//! Admits at most `limit` events within any trailing `window` ending now.
//!
//! ## Algorithm: Sliding Window Log
//!
//! ```text
//! window = 1s, limit = 3
//!
//! admitted: [t=0.10, t=0.40, t=0.90]        now = 1.05 → cutoff = 0.05
//!            └──────── all after cutoff ─┘   3 in window → deny
//!
//! admitted: [t=0.10, t=0.40, t=0.90]        now = 1.20 → cutoff = 0.20
//!            ╳ evicted                       2 in window → admit, append 1.20
//! ```
//!
//! Timestamps are appended in non-decreasing order, so the entries still in
//! the window always form a suffix of the log. Eviction walks back from the
//! newest entry and drops everything before the first entry at or before the
//! cutoff. Pruning happens only inside calls; no background timer runs.
//!
//! ## Usage
//!
//! ```
//! use product_catalog_runtime::SlidingWindowRateLimiter;
//!
//! let limiter = SlidingWindowRateLimiter::new(5);
//!
//! let admitted = (0..10).filter(|_| limiter.allow()).count();
//! assert_eq!(admitted, 5);
//! ```

use crate::metrics::RateLimiterMetrics;
use product_catalog_core::environment::{Clock, SystemClock};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Default window length
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(1);

/// Returned by [`with_rate_limit`] when admission is denied.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Rate limit exceeded ({limit} per {window:?})")]
pub struct RateLimitExceeded {
    /// Configured maximum admissions per window
    pub limit: usize,
    /// Configured window length
    pub window: Duration,
}

/// Sliding-window admission gate.
///
/// One instance is one budget. `allow` may be called from any number of
/// threads; each call takes the internal lock for its whole
/// read-modify-write, so concurrent callers can never be admitted past the
/// limit.
#[derive(Debug)]
pub struct SlidingWindowRateLimiter<C: Clock = SystemClock> {
    limit: usize,
    window: Duration,
    clock: C,
    admitted: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowRateLimiter {
    /// Create a limiter admitting `limit` events per second.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self::with_window(limit, DEFAULT_WINDOW)
    }

    /// Create a limiter admitting `limit` events per `window`.
    #[must_use]
    pub fn with_window(limit: usize, window: Duration) -> Self {
        Self::with_clock(limit, window, SystemClock)
    }
}

impl<C: Clock> SlidingWindowRateLimiter<C> {
    /// Create a limiter reading time from `clock`.
    #[must_use]
    pub fn with_clock(limit: usize, window: Duration, clock: C) -> Self {
        Self {
            limit,
            window,
            clock,
            admitted: Mutex::new(VecDeque::with_capacity(limit.min(1024))),
        }
    }

    /// Decide whether one more event may happen now.
    ///
    /// Admitted events are recorded; denied ones are not. A limit of zero
    /// denies everything.
    pub fn allow(&self) -> bool {
        let mut admitted = self.lock();
        let now = self.clock.now();
        self.evict_expired(&mut admitted, now);

        if admitted.len() >= self.limit {
            RateLimiterMetrics::record_denied();
            debug!(
                limit = self.limit,
                in_window = admitted.len(),
                "Rate limit exceeded"
            );
            return false;
        }

        admitted.push_back(now);
        RateLimiterMetrics::record_allowed();
        true
    }

    /// Number of admissions currently counted against the window.
    #[must_use]
    pub fn in_window(&self) -> usize {
        let mut admitted = self.lock();
        let now = self.clock.now();
        self.evict_expired(&mut admitted, now);
        admitted.len()
    }

    /// Maximum admissions per window.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Window length.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    // The log is valid after every mutation, so a poisoned lock is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        self.admitted.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop every entry before the trailing run of entries newer than `now - window`.
    fn evict_expired(&self, admitted: &mut VecDeque<Instant>, now: Instant) {
        let Some(cutoff) = now.checked_sub(self.window) else {
            return;
        };

        let in_window = admitted
            .iter()
            .rev()
            .take_while(|&&timestamp| timestamp > cutoff)
            .count();
        let expired = admitted.len() - in_window;
        admitted.drain(..expired);
    }
}

/// Run `operation` only if `limiter` admits it.
///
/// # Errors
///
/// Returns `RateLimitExceeded` without polling `operation` when denied.
///
/// # Example
///
/// ```ignore
/// let result = with_rate_limit(&limiter, async {
///     expensive_operation().await
/// }).await?;
/// ```
pub async fn with_rate_limit<C, F>(
    limiter: &SlidingWindowRateLimiter<C>,
    operation: F,
) -> Result<F::Output, RateLimitExceeded>
where
    C: Clock,
    F: std::future::Future,
{
    if !limiter.allow() {
        return Err(RateLimitExceeded {
            limit: limiter.limit(),
            window: limiter.window(),
        });
    }

    Ok(operation.await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use product_catalog_testing::ManualClock;
    use std::sync::{Arc, Barrier};

    fn limiter(limit: usize) -> (SlidingWindowRateLimiter<Arc<ManualClock>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (
            SlidingWindowRateLimiter::with_clock(limit, DEFAULT_WINDOW, Arc::clone(&clock)),
            clock,
        )
    }

    #[test]
    fn test_allows_limit_then_denies() {
        let (limiter, _clock) = limiter(5);

        for i in 0..5 {
            assert!(limiter.allow(), "request {i} should be allowed");
        }
        for i in 5..10 {
            assert!(!limiter.allow(), "request {i} should be denied");
        }
    }

    #[test]
    fn test_admits_again_after_window() {
        let (limiter, clock) = limiter(5);
        for _ in 0..5 {
            assert!(limiter.allow());
        }
        assert!(!limiter.allow());

        clock.advance(Duration::from_millis(1001));

        assert!(limiter.allow());
        assert_eq!(limiter.in_window(), 1);
    }

    #[test]
    fn test_entry_exactly_at_cutoff_is_expired() {
        let (limiter, clock) = limiter(1);
        assert!(limiter.allow());

        clock.advance(DEFAULT_WINDOW);

        assert!(limiter.allow());
    }

    #[test]
    fn test_window_slides() {
        let (limiter, clock) = limiter(2);

        assert!(limiter.allow()); // t = 0
        clock.advance(Duration::from_millis(600));
        assert!(limiter.allow()); // t = 600
        assert!(!limiter.allow());

        clock.advance(Duration::from_millis(500)); // t = 1100, first entry expired
        assert!(limiter.allow());
        assert!(!limiter.allow());
        assert_eq!(limiter.in_window(), 2);
    }

    #[test]
    fn test_spaced_calls_never_accumulate() {
        let (limiter, clock) = limiter(5);

        for i in 0..10 {
            clock.advance(Duration::from_millis(200));
            assert!(limiter.allow(), "request {i} should be allowed");
        }
        assert!(limiter.in_window() <= 5);
    }

    #[test]
    fn test_denied_calls_are_not_recorded() {
        let (limiter, clock) = limiter(1);
        assert!(limiter.allow());

        for _ in 0..10 {
            clock.advance(Duration::from_millis(50));
            assert!(!limiter.allow());
        }

        // Only the single admission counts; it expires one window after t = 0.
        clock.advance(Duration::from_millis(500));
        assert!(limiter.allow());
    }

    #[test]
    fn test_zero_limit_always_denies() {
        let (limiter, clock) = limiter(0);
        assert!(!limiter.allow());
        clock.advance(Duration::from_secs(10));
        assert!(!limiter.allow());
    }

    #[test]
    fn test_concurrent_callers_never_over_admit() {
        const THREADS: usize = 32;
        const LIMIT: usize = 10;

        let limiter = Arc::new(SlidingWindowRateLimiter::with_window(
            LIMIT,
            Duration::from_secs(60),
        ));
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    limiter.allow()
                })
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&allowed| allowed)
            .count();

        assert_eq!(admitted, LIMIT.min(THREADS));
    }

    #[test]
    fn test_with_rate_limit_runs_only_when_admitted() {
        let limiter = SlidingWindowRateLimiter::new(1);

        let first = tokio_test::block_on(with_rate_limit(&limiter, async { 42 }));
        let second = tokio_test::block_on(with_rate_limit(&limiter, async { 43 }));

        assert_eq!(first, Ok(42));
        assert_eq!(
            second,
            Err(RateLimitExceeded {
                limit: 1,
                window: DEFAULT_WINDOW
            })
        );
    }
}
