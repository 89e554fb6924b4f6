//! Pause policies applied between records
//!
//! Records are processed strictly one after another; the policy decides how
//! long to wait before the next one. Policies see whether the previous record
//! ran into service failures so backoff can react to a struggling service.
//! The token-bucket policy paces individual requests instead, through
//! [`RateLimitedSource`].

use super::tmdb_client::{LookupError, MetadataSource, MovieDetails, SearchHit};
use async_trait::async_trait;
use frame_common::config::{ThrottleConfig, ThrottleKind};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// How the previous record went against the external service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordHealth {
    /// Every external call succeeded
    Clean,
    /// A lookup or search failed in a way that points at the service
    /// (transport error, 429 or 5xx)
    Degraded,
}

/// Inter-record pause policy
#[async_trait]
pub trait ThrottlePolicy: Send {
    /// Policy name for logs
    fn name(&self) -> &'static str;

    /// Wait before the next record
    async fn pause(&mut self, health: RecordHealth);
}

/// Same delay after every record
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl ThrottlePolicy for FixedDelay {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn pause(&mut self, _health: RecordHealth) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Delay multiplied by `factor` after each degraded record, reset after a clean one
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base: Duration,
    max: Duration,
    factor: f64,
    current: Duration,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, max: Duration, factor: f64) -> Self {
        let max = max.max(base);
        Self {
            base,
            max,
            factor: if factor >= 1.0 { factor } else { 1.0 },
            current: base,
        }
    }

    /// Advance the backoff state and return the delay to apply
    pub fn next_delay(&mut self, health: RecordHealth) -> Duration {
        match health {
            RecordHealth::Clean => self.current = self.base,
            RecordHealth::Degraded => {
                let grown =
                    Duration::from_nanos((self.current.as_nanos() as f64 * self.factor) as u64);
                self.current = grown.min(self.max);
            }
        }
        self.current
    }
}

#[async_trait]
impl ThrottlePolicy for ExponentialBackoff {
    fn name(&self) -> &'static str {
        "backoff"
    }

    async fn pause(&mut self, health: RecordHealth) {
        let delay = self.next_delay(health);
        if health == RecordHealth::Degraded {
            tracing::debug!("Backing off: waiting {:?}", delay);
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

type DirectLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Token bucket shared by every request made through a [`RateLimitedSource`]
pub struct TokenBucket {
    rate_limiter: DirectLimiter,
}

impl TokenBucket {
    pub fn new(requests_per_second: NonZeroU32) -> Self {
        Self {
            rate_limiter: RateLimiter::direct(Quota::per_second(requests_per_second)),
        }
    }

    /// Wait for one request permit
    pub async fn acquire(&self) {
        self.rate_limiter.until_ready().await;
    }
}

/// `MetadataSource` that takes a token before every fetch and search
pub struct RateLimitedSource {
    inner: Arc<dyn MetadataSource>,
    bucket: TokenBucket,
}

impl RateLimitedSource {
    pub fn new(inner: Arc<dyn MetadataSource>, bucket: TokenBucket) -> Self {
        Self { inner, bucket }
    }
}

#[async_trait]
impl MetadataSource for RateLimitedSource {
    async fn fetch_by_id(&self, id: &str) -> Result<MovieDetails, LookupError> {
        self.bucket.acquire().await;
        self.inner.fetch_by_id(id).await
    }

    async fn search(
        &self,
        title: &str,
        year: Option<&str>,
    ) -> Result<Vec<SearchHit>, LookupError> {
        self.bucket.acquire().await;
        self.inner.search(title, year).await
    }
}

/// No pause between records; requests are paced by the token bucket instead
#[derive(Debug, Clone, Copy, Default)]
pub struct PerRequestQuota;

#[async_trait]
impl ThrottlePolicy for PerRequestQuota {
    fn name(&self) -> &'static str {
        "token-bucket"
    }

    async fn pause(&mut self, _health: RecordHealth) {}
}

/// Build the configured inter-record policy
pub fn build_throttle(config: &ThrottleConfig) -> Box<dyn ThrottlePolicy> {
    let delay = Duration::from_millis(config.delay_ms);

    match config.policy {
        ThrottleKind::Fixed => Box::new(FixedDelay::new(delay)),
        ThrottleKind::Backoff => Box::new(ExponentialBackoff::new(
            delay,
            Duration::from_millis(config.max_delay_ms),
            config.backoff_factor,
        )),
        ThrottleKind::TokenBucket => Box::new(PerRequestQuota),
    }
}

/// Wrap `source` in the request quota when the token-bucket policy is selected
pub fn rate_limit_source(
    config: &ThrottleConfig,
    source: Arc<dyn MetadataSource>,
) -> Arc<dyn MetadataSource> {
    match config.policy {
        ThrottleKind::TokenBucket => {
            let rate = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
            tracing::debug!(requests_per_second = rate.get(), "Rate limiting metadata requests");
            Arc::new(RateLimitedSource::new(source, TokenBucket::new(rate)))
        }
        ThrottleKind::Fixed | ThrottleKind::Backoff => source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_backoff_grows_caps_and_resets() {
        let mut backoff = ExponentialBackoff::new(
            Duration::from_millis(100),
            Duration::from_millis(500),
            2.0,
        );

        assert_eq!(backoff.next_delay(RecordHealth::Clean), Duration::from_millis(100));
        assert_eq!(backoff.next_delay(RecordHealth::Degraded), Duration::from_millis(200));
        assert_eq!(backoff.next_delay(RecordHealth::Degraded), Duration::from_millis(400));
        assert_eq!(backoff.next_delay(RecordHealth::Degraded), Duration::from_millis(500));
        assert_eq!(backoff.next_delay(RecordHealth::Degraded), Duration::from_millis(500));
        assert_eq!(backoff.next_delay(RecordHealth::Clean), Duration::from_millis(100));
    }

    #[test]
    fn test_backoff_factor_below_one_never_shrinks() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_millis(100), Duration::from_millis(50), 0.5);
        assert_eq!(backoff.next_delay(RecordHealth::Degraded), Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_fixed_delay_waits() {
        let mut policy = FixedDelay::new(Duration::from_millis(50));

        let start = Instant::now();
        policy.pause(RecordHealth::Clean).await;
        assert!(start.elapsed() >= Duration::from_millis(45));
    }

    #[tokio::test]
    async fn test_token_bucket_timing() {
        let bucket = TokenBucket::new(NonZeroU32::new(4).unwrap());

        let start = Instant::now();

        // Burst capacity equals the per-second quota
        for _ in 0..4 {
            bucket.acquire().await;
        }
        let burst_elapsed = start.elapsed();

        // Fifth permit has to wait for replenishment (~250ms)
        bucket.acquire().await;
        let fifth_elapsed = start.elapsed();

        assert!(burst_elapsed < Duration::from_millis(100));
        assert!(fifth_elapsed >= Duration::from_millis(200));
    }

    #[test]
    fn test_build_throttle_names() {
        let mut config = ThrottleConfig::default();
        assert_eq!(build_throttle(&config).name(), "fixed");

        config.policy = ThrottleKind::Backoff;
        assert_eq!(build_throttle(&config).name(), "backoff");

        config.policy = ThrottleKind::TokenBucket;
        config.requests_per_second = 0;
        assert_eq!(build_throttle(&config).name(), "token-bucket");
    }

    #[tokio::test]
    async fn test_per_request_quota_never_sleeps() {
        let mut policy = PerRequestQuota;

        let start = Instant::now();
        for _ in 0..10 {
            policy.pause(RecordHealth::Degraded).await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
