use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;

/// Pause policy applied between write batches to stay under the remote
/// API's rate limit.
#[async_trait]
pub trait Throttle: Send + Sync {
    /// Called once, right before the first batch is written.
    fn begin(&self) {}

    /// Called before every batch after the first.
    async fn wait(&self);

    /// Short human-readable description for the run log.
    fn describe(&self) -> String;
}

/// No pause at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Throttle for NoDelay {
    async fn wait(&self) {}

    fn describe(&self) -> String {
        "no delay".to_string()
    }
}

/// Sleep a fixed duration between batches.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

#[async_trait]
impl Throttle for FixedDelay {
    async fn wait(&self) {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
    }

    fn describe(&self) -> String {
        format!("fixed delay {}ms", self.0.as_millis())
    }
}

/// Token bucket with a single-token burst: consecutive batches are spaced
/// `1s / per_second` apart.
pub struct RateLimited {
    limiter: DefaultDirectRateLimiter,
    per_second: NonZeroU32,
}

impl RateLimited {
    pub fn per_second(per_second: NonZeroU32) -> Self {
        let quota = Quota::with_period(Duration::from_secs(1) / per_second.get())
            .unwrap_or_else(|| Quota::per_second(per_second))
            .allow_burst(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::direct(quota),
            per_second,
        }
    }
}

#[async_trait]
impl Throttle for RateLimited {
    /// The first batch takes the initial token so the second one waits a
    /// full period.
    fn begin(&self) {
        let _ = self.limiter.check();
    }

    async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    fn describe(&self) -> String {
        format!("token bucket {}/s", self.per_second)
    }
}
