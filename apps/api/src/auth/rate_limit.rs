//! Per-key request throttling.
//!
//! The limiter is injected into `AppState` so a multi-instance deployment
//! can share one counter (`RedisRateLimiter`). `InMemoryRateLimiter` only
//! sees the requests of its own process and forgets everything on restart.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub limit: u32,
    pub window: Duration,
}

/// Five authorization URLs per user per minute.
pub const LINKEDIN_AUTH_POLICY: RateLimitPolicy = RateLimitPolicy {
    limit: 5,
    window: Duration::from_secs(60),
};

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Records one hit for `key` and reports whether it is within the policy.
    async fn check(&self, key: &str, policy: RateLimitPolicy) -> Result<bool, AppError>;
}

/// Sliding-window log kept in process memory.
#[derive(Default)]
pub struct InMemoryRateLimiter {
    logs: Mutex<HashMap<String, HitLog>>,
}

struct HitLog {
    window: Duration,
    hits: VecDeque<Instant>,
}

impl HitLog {
    fn prune(&mut self, now: Instant) {
        while self
            .hits
            .front()
            .is_some_and(|&hit| now.duration_since(hit) >= self.window)
        {
            self.hits.pop_front();
        }
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: &str, policy: RateLimitPolicy) -> Result<bool, AppError> {
        let now = Instant::now();
        let mut logs = self.logs.lock().await;

        // Forget keys whose whole log has aged out.
        logs.retain(|_, log| {
            log.prune(now);
            !log.hits.is_empty()
        });

        let log = logs.entry(key.to_string()).or_insert_with(|| HitLog {
            window: policy.window,
            hits: VecDeque::new(),
        });
        log.window = policy.window;

        if log.hits.len() >= policy.limit as usize {
            return Ok(false);
        }
        log.hits.push_back(now);
        Ok(true)
    }
}

#[cfg(test)]
impl InMemoryRateLimiter {
    async fn tracked_keys(&self) -> usize {
        self.logs.lock().await.len()
    }
}

/// Fixed-window counter shared through Redis.
///
/// Each window gets its own key, and the counter and its TTL are written in
/// one atomic pipeline, so no counter outlives its window.
#[derive(Clone)]
pub struct RedisRateLimiter {
    client: redis::Client,
}

impl RedisRateLimiter {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, key: &str, policy: RateLimitPolicy) -> Result<bool, AppError> {
        let now_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| limiter_unavailable(e.to_string()))?
            .as_secs();
        let window_key = window_key(key, policy, now_secs);

        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| limiter_unavailable(e.to_string()))?;

        let (count,): (u64,) = redis::pipe()
            .atomic()
            .incr(&window_key, 1u64)
            .expire(&window_key, window_secs(policy) as i64)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| limiter_unavailable(e.to_string()))?;

        Ok(within_limit(count, policy))
    }
}

fn window_secs(policy: RateLimitPolicy) -> u64 {
    policy.window.as_secs().max(1)
}

/// Key of the fixed window that contains `now_secs`.
fn window_key(key: &str, policy: RateLimitPolicy, now_secs: u64) -> String {
    format!("ratelimit:{key}:{}", now_secs / window_secs(policy))
}

fn within_limit(count: u64, policy: RateLimitPolicy) -> bool {
    count <= u64::from(policy.limit)
}

fn limiter_unavailable(detail: String) -> AppError {
    AppError::upstream(
        "redis",
        format!("rate limit store unavailable: {detail}"),
        "Service temporarily unavailable. Please try again later.",
    )
}
