//! Fixed-window rate limiting for abuse-prone endpoints.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::{ServerError, ServerResult};

/// Identifies one rate-limited bucket: a resource name plus an optional
/// caller identifier (client address, user id).
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct RateLimiterKey {
    pub resource: String,
    pub identifier: Option<String>,
}

impl RateLimiterKey {
    pub fn new(resource: impl Into<String>, identifier: Option<String>) -> Self {
        RateLimiterKey {
            resource: resource.into(),
            identifier,
        }
    }
}

impl fmt::Display for RateLimiterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.identifier {
            Some(id) => write!(f, "{}:{}", self.resource, id),
            None => write!(f, "{}", self.resource),
        }
    }
}

/// Limit configuration: at most `max_requests` per `window_ms`.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    pub max_requests: u32,
    pub window_ms: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        RateLimiterConfig {
            max_requests: 100,
            window_ms: 60_000,
        }
    }
}

struct LocalBucket {
    start_time: Instant,
    remaining: u32,
}

/// In-process fixed-window limiter. Buckets reset when a request arrives
/// after the window has elapsed; empty buckets are never swept, so the key
/// space must stay bounded (it is derived from resource + client).
pub struct RateLimiter {
    config: RateLimiterConfig,
    buckets: Mutex<HashMap<RateLimiterKey, LocalBucket>>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        RateLimiter {
            config,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Consumes one request from the bucket for `key`, or fails with
    /// `RateLimitExceeded` once the window's budget is spent.
    pub fn allow(&self, key: &RateLimiterKey) -> ServerResult<()> {
        let window = Duration::from_millis(self.config.window_ms);
        let now = Instant::now();

        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let bucket = buckets.entry(key.clone()).or_insert_with(|| LocalBucket {
            start_time: now,
            remaining: self.config.max_requests,
        });

        if now.duration_since(bucket.start_time) >= window {
            bucket.start_time = now;
            bucket.remaining = self.config.max_requests;
        }

        if bucket.remaining == 0 {
            return Err(ServerError::RateLimitExceeded {
                resource: key.resource.clone(),
                identifier: key.identifier.clone().unwrap_or_default(),
                max_requests: self.config.max_requests,
                window_ms: self.config.window_ms,
            });
        }

        bucket.remaining -= 1;
        Ok(())
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
