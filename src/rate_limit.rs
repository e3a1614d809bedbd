//! Token bucket rate limiter
//!
//! One limiter is created per [`crate::XtreamClient`] and shared by every call
//! made through it. Waiters queue on a fair mutex, so under contention tokens
//! are handed out in the order callers asked for them. The lock only covers
//! token accounting (including the wait for the next token), never the HTTP
//! call.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::RateLimitPolicy;
use crate::error::{Result, XtreamError};

/// Float slack when checking for a whole token after a timed refill
const TOKEN_EPSILON: f64 = 1e-9;

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, rate: f64, capacity: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(capacity);
        self.last_refill = now;
    }
}

/// Shared token bucket
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<Bucket>,
    /// Tokens per second; `0` never refills, infinite disables limiting
    rate: f64,
    capacity: f64,
}

impl RateLimiter {
    /// Create a full bucket from a policy.
    ///
    /// A burst of zero is raised to one, otherwise no call could ever proceed.
    /// Negative or NaN rates are treated as zero.
    pub fn new(policy: RateLimitPolicy) -> Self {
        let rate = if policy.rate.is_nan() || policy.rate < 0.0 {
            0.0
        } else {
            policy.rate
        };
        let capacity = f64::from(policy.burst.max(1));

        Self {
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            rate,
            capacity,
        }
    }

    fn next_token_in(&self, tokens: f64) -> Option<Duration> {
        if self.rate == 0.0 {
            return None;
        }
        Duration::try_from_secs_f64((1.0 - tokens) / self.rate).ok()
    }

    /// Wait for one token or for `ctx` to be cancelled, whichever comes first.
    pub async fn acquire(&self, ctx: &CancellationToken) -> Result<()> {
        if ctx.is_cancelled() {
            return Err(XtreamError::Cancelled);
        }
        if self.rate.is_infinite() {
            return Ok(());
        }

        let mut bucket = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(XtreamError::Cancelled),
            guard = self.bucket.lock() => guard,
        };

        loop {
            bucket.refill(self.rate, self.capacity);
            if bucket.tokens >= 1.0 - TOKEN_EPSILON {
                bucket.tokens = (bucket.tokens - 1.0).max(0.0);
                return Ok(());
            }

            // A zero rate never refills, and a tiny one refills past what a
            // Duration can hold; only cancellation ends either wait
            let wait = match self.next_token_in(bucket.tokens) {
                Some(wait) => wait,
                None => {
                    ctx.cancelled().await;
                    return Err(XtreamError::Cancelled);
                }
            };
            debug!(wait_ms = wait.as_millis() as u64, "Rate limited, waiting for token");

            tokio::select! {
                biased;
                _ = ctx.cancelled() => return Err(XtreamError::Cancelled),
                _ = sleep(wait) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn limiter(rate: f64, burst: u32) -> RateLimiter {
        RateLimiter::new(RateLimitPolicy { rate, burst })
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_then_sustained_rate() {
        let limiter = limiter(1.0, 2);
        let ctx = CancellationToken::new();
        let start = Instant::now();

        limiter.acquire(&ctx).await.unwrap();
        limiter.acquire(&ctx).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(1));

        limiter.acquire(&ctx).await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(999), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(1100), "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_accumulation_capped_at_burst() {
        let limiter = limiter(10.0, 3);
        let ctx = CancellationToken::new();

        for _ in 0..3 {
            limiter.acquire(&ctx).await.unwrap();
        }
        sleep(Duration::from_secs(60)).await;

        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire(&ctx).await.unwrap();
        }
        assert!(start.elapsed() < Duration::from_millis(1));

        limiter.acquire(&ctx).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(99));
    }

    #[tokio::test]
    async fn test_cancelled_before_acquire() {
        let limiter = limiter(1.0, 1);
        let ctx = CancellationToken::new();
        ctx.cancel();

        let err = limiter.acquire(&ctx).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_waiting() {
        let limiter = Arc::new(limiter(0.001, 1));
        let ctx = CancellationToken::new();
        limiter.acquire(&ctx).await.unwrap();

        let waiter = {
            let limiter = limiter.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move { limiter.acquire(&ctx).await })
        };

        sleep(Duration::from_millis(10)).await;
        ctx.cancel();

        let err = waiter.await.unwrap().unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_rate_waits_for_cancellation() {
        let limiter = limiter(0.0, 1);
        let ctx = CancellationToken::new();
        limiter.acquire(&ctx).await.unwrap();

        let canceller = ctx.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(5)).await;
            canceller.cancel();
        });

        let err = limiter.acquire(&ctx).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tiny_rate_waits_for_cancellation() {
        let limiter = limiter(1e-25, 1);
        let ctx = CancellationToken::new();
        limiter.acquire(&ctx).await.unwrap();

        let canceller = ctx.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let err = limiter.acquire(&ctx).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiters_served_in_request_order() {
        let limiter = Arc::new(limiter(1.0, 1));
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let ctx = CancellationToken::new();

        let mut handles = Vec::new();
        for id in 0..4 {
            let limiter = limiter.clone();
            let order = order.clone();
            let ctx = ctx.clone();
            handles.push(tokio::spawn(async move {
                limiter.acquire(&ctx).await.unwrap();
                order.lock().unwrap().push(id);
            }));
            tokio::task::yield_now().await;
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_unlimited_never_waits() {
        let limiter = RateLimiter::new(RateLimitPolicy::unlimited());
        let ctx = CancellationToken::new();
        for _ in 0..1000 {
            limiter.acquire(&ctx).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_zero_burst_still_allows_one() {
        let limiter = limiter(1.0, 0);
        let ctx = CancellationToken::new();
        limiter.acquire(&ctx).await.unwrap();
    }
}
