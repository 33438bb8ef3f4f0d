//! Token-bucket rate limiting for order-gateway calls.
//!
//! Same algorithm the risk layer has always used for outbound order flow:
//! a bucket refills continuously at a fixed rate and each call consumes one
//! token, with atomics doing the bookkeeping so the hot path never takes a
//! lock to check whether it's allowed to proceed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::warn;

/// A single token bucket. Tokens are tracked at millitoken precision so
/// fractional refill rates don't get lost to integer truncation between
/// refills.
#[derive(Clone)]
pub struct TokenBucket {
    capacity_millitokens: u64,
    refill_per_second_millitokens: u64,
    tokens: Arc<AtomicU64>,
    last_refill: Arc<Mutex<Instant>>,
    total_allowed: Arc<AtomicU64>,
    total_rejected: Arc<AtomicU64>,
}

impl TokenBucket {
    pub fn new(capacity: u64, refill_per_second: u64) -> Self {
        Self {
            capacity_millitokens: capacity * 1000,
            refill_per_second_millitokens: refill_per_second * 1000,
            tokens: Arc::new(AtomicU64::new(capacity * 1000)),
            last_refill: Arc::new(Mutex::new(Instant::now())),
            total_allowed: Arc::new(AtomicU64::new(0)),
            total_rejected: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Attempts to consume one token. Returns `false` (and does not
    /// mutate the bucket) when the bucket is empty.
    pub fn try_acquire(&self) -> bool {
        self.refill();

        let mut current = self.tokens.load(Ordering::Acquire);
        loop {
            if current < 1000 {
                self.total_rejected.fetch_add(1, Ordering::Relaxed);
                return false;
            }
            match self.tokens.compare_exchange_weak(
                current,
                current - 1000,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.total_allowed.fetch_add(1, Ordering::Relaxed);
                    return true;
                }
                Err(actual) => current = actual,
            }
        }
    }

    fn refill(&self) {
        let mut last_refill = self.last_refill.lock();
        let now = Instant::now();
        let elapsed = now.duration_since(*last_refill);
        if elapsed < Duration::from_millis(10) {
            return;
        }

        let added = (self.refill_per_second_millitokens as f64 * elapsed.as_secs_f64()) as u64;
        if added == 0 {
            return;
        }

        let current = self.tokens.load(Ordering::Acquire);
        let updated = (current + added).min(self.capacity_millitokens);
        self.tokens.store(updated, Ordering::Release);
        *last_refill = now;
    }

    pub fn available_tokens(&self) -> u64 {
        self.tokens.load(Ordering::Acquire) / 1000
    }

    pub fn total_rejected(&self) -> u64 {
        self.total_rejected.load(Ordering::Relaxed)
    }
}

/// Dual-window limiter: a call must clear both a per-second and a
/// per-minute bucket. Gateways sized for different venues get different
/// presets, but both windows are always enforced together.
#[derive(Clone)]
pub struct GatewayRateLimiter {
    per_second: TokenBucket,
    per_minute: TokenBucket,
}

impl GatewayRateLimiter {
    pub fn new(per_second_limit: u64, per_minute_limit: u64) -> Self {
        Self {
            per_second: TokenBucket::new(per_second_limit, per_second_limit),
            per_minute: TokenBucket::new(per_minute_limit, per_minute_limit / 60),
        }
    }

    /// Conservative preset suitable for a venue with no published limits.
    pub fn conservative() -> Self {
        Self::new(5, 200)
    }

    /// Checks and consumes one unit from both windows. Short-circuits (and
    /// does not touch the per-minute bucket) if the per-second window is
    /// already exhausted, so a hammered limiter doesn't drain the longer
    /// window for calls that were already going to be rejected.
    pub fn try_acquire(&self) -> bool {
        if !self.per_second.try_acquire() {
            warn!("gateway rate limit exceeded (per-second window)");
            return false;
        }
        if !self.per_minute.try_acquire() {
            warn!("gateway rate limit exceeded (per-minute window)");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_burst_up_to_capacity() {
        let bucket = TokenBucket::new(5, 5);
        for _ in 0..5 {
            assert!(bucket.try_acquire());
        }
        assert!(!bucket.try_acquire());
    }

    #[test]
    fn refills_after_interval() {
        let bucket = TokenBucket::new(2, 100);
        assert!(bucket.try_acquire());
        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());
        std::thread::sleep(Duration::from_millis(50));
        assert!(bucket.try_acquire());
    }

    #[test]
    fn dual_window_limiter_enforces_tighter_window() {
        let limiter = GatewayRateLimiter::new(2, 1000);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }
}
