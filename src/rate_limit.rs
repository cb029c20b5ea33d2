//! Token bucket rate limiting, keyed per client (authenticated user id, or
//! IP address for anonymous traffic).
//!
//! Bucket math here is pure arithmetic with no `.await` inside the
//! critical section, so a short-held `std::sync::Mutex` is cheaper than an
//! async lock.

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

/// A single client's token bucket.
#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
    capacity: u32,
    refill_rate: f64,
}

impl TokenBucket {
    fn new(capacity: u32, refill_rate: f64) -> Self {
        Self {
            tokens: capacity as f64,
            last_update: Instant::now(),
            capacity,
            refill_rate,
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();
        if elapsed > 0.0 {
            self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity as f64);
            self.last_update = now;
        }
    }

    /// Refill then attempt to consume one token. Returns whether the
    /// request is allowed, plus the remaining whole tokens and the number
    /// of seconds until at least one token is available again.
    fn consume(&mut self) -> (bool, u32, u64) {
        let now = Instant::now();
        self.refill(now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            (true, self.tokens.floor() as u32, 0)
        } else {
            let deficit = 1.0 - self.tokens;
            let retry_after = if self.refill_rate > 0.0 {
                (deficit / self.refill_rate).ceil() as u64
            } else {
                u64::MAX
            };
            (false, 0, retry_after.max(1))
        }
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_update)
    }
}

/// Outcome of a rate limit check, enough to populate `X-RateLimit-*` and
/// `Retry-After` response headers.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitInfo {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub retry_after_secs: u64,
}

/// Shared rate limiter state. One bucket per client key, swept
/// periodically to bound memory use under churn (many distinct IPs).
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, TokenBucket>>,
    requests_per_minute: u32,
    capacity: u32,
    refill_rate: f64,
    idle_eviction: Duration,
}

impl RateLimiter {
    /// `requests_per_minute` sets the refill rate (and is reported verbatim
    /// as `X-RateLimit-Limit`); `burst_size` sets bucket capacity. Buckets
    /// idle for longer than `idle_eviction` are dropped by
    /// [`RateLimiter::sweep`].
    pub fn new(requests_per_minute: u32, burst_size: u32, idle_eviction: Duration) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            requests_per_minute,
            capacity: burst_size.max(1),
            refill_rate: requests_per_minute as f64 / 60.0,
            idle_eviction,
        }
    }

    /// Check and consume one token for `key`, creating a fresh bucket on
    /// first sight of the client.
    pub fn check(&self, key: &str) -> RateLimitInfo {
        let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");
        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.capacity, self.refill_rate));

        let (allowed, remaining, retry_after_secs) = bucket.consume();
        RateLimitInfo {
            allowed,
            limit: self.requests_per_minute,
            remaining,
            retry_after_secs,
        }
    }

    /// Drop buckets that have sat untouched longer than `idle_eviction`.
    /// Intended to run on a periodic background tick.
    pub fn sweep(&self) {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");
        let before = buckets.len();
        buckets.retain(|_, bucket| bucket.idle_for(now) < self.idle_eviction);
        let removed = before - buckets.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = buckets.len(), "rate limiter sweep");
        }
    }

    /// Spawn the periodic sweep as a background task.
    pub fn spawn_sweeper(self: std::sync::Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                self.sweep();
            }
        })
    }
}

/// Derives the rate-limit bucket key for a request: the authenticated
/// subject when present, otherwise the client IP.
pub fn client_key(principal_subject: Option<&str>, ip: std::net::IpAddr) -> String {
    match principal_subject {
        Some(subject) => format!("user:{subject}"),
        None => format!("ip:{ip}"),
    }
}
