use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub requests_per_min: Option<u64>,
    /// Minimum spacing between two consecutive requests
    pub delay: Duration,
}

/// Request pacing shared by all crawl workers
#[derive(Clone, Debug)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    limits: Limits,
    // token bucket: current tokens and time of last refill
    rpm_tokens: Mutex<(f64, Instant)>,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(limits: Limits) -> Self {
        let now = Instant::now();
        let rpm_capacity = limits.requests_per_min.unwrap_or(0) as f64;
        Self {
            inner: Arc::new(Inner {
                limits,
                rpm_tokens: Mutex::new((rpm_capacity, now)),
                last_request: Mutex::new(None),
            }),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(Limits::default())
    }

    /// Wait until one more request is allowed
    pub async fn acquire(&self) {
        if let Some(rpm) = self.inner.limits.requests_per_min {
            if rpm > 0 {
                self.consume_token(rpm as f64, 60.0).await;
            }
        }
        if !self.inner.limits.delay.is_zero() {
            self.space_out().await;
        }
    }

    async fn consume_token(&self, capacity: f64, period_secs: f64) {
        // refill continuously, wait until a whole token accumulates
        loop {
            let mut guard = self.inner.rpm_tokens.lock().await;
            let (ref mut tokens, ref mut last) = *guard;
            let now = Instant::now();
            let elapsed = now.duration_since(*last).as_secs_f64();
            let refill_rate = capacity / period_secs;
            *tokens = (*tokens + elapsed * refill_rate).min(capacity);
            *last = now;
            if *tokens >= 1.0 {
                *tokens -= 1.0;
                break;
            }
            let secs = (1.0 - *tokens) / refill_rate;
            drop(guard);
            tokio::time::sleep(Duration::from_secs_f64(secs.max(0.001))).await;
        }
    }

    async fn space_out(&self) {
        // holding the lock while sleeping serializes waiters in arrival order
        let mut last = self.inner.last_request.lock().await;
        if let Some(prev) = *last {
            let ready_at = prev + self.inner.limits.delay;
            tokio::time::sleep_until(ready_at).await;
        }
        *last = Some(Instant::now());
    }
}
