// Pacing between upstream page requests.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Suspends until the next request may be sent.
    async fn wait(&self);
}

/// Sleeps a fixed duration on every call.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

#[async_trait]
impl RateLimiter for FixedDelay {
    async fn wait(&self) {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Unthrottled;

#[async_trait]
impl RateLimiter for Unthrottled {
    async fn wait(&self) {}
}

/// Allows bursts of up to `capacity` calls, refilled one token per `refill_every`.
pub struct TokenBucket {
    capacity: u32,
    refill_every: Duration,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: u32,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(capacity: u32, refill_every: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            refill_every,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        if self.refill_every.is_zero() {
            state.tokens = self.capacity;
            state.last_refill = now;
            return;
        }
        let elapsed = now.duration_since(state.last_refill);
        let earned = elapsed.as_nanos() / self.refill_every.as_nanos();
        if earned == 0 {
            return;
        }
        let tokens = state.tokens as u128 + earned;
        if tokens >= self.capacity as u128 {
            state.tokens = self.capacity;
            state.last_refill = now;
        } else {
            state.tokens = tokens as u32;
            state.last_refill += self.refill_every * earned as u32;
        }
    }
}

#[async_trait]
impl RateLimiter for TokenBucket {
    async fn wait(&self) {
        loop {
            let sleep_for = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                self.refill(&mut state, now);
                if state.tokens > 0 {
                    state.tokens -= 1;
                    return;
                }
                (state.last_refill + self.refill_every).saturating_duration_since(now)
            };
            tokio::time::sleep(sleep_for).await;
        }
    }
}
