// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter for the contact endpoint.
//!
//! Each client key gets a counter that opens on its first request and
//! expires `window_ms` later. Requests beyond `max_requests` inside the
//! window are rejected with a retry hint. Store faults fail open.

pub mod redis_store;
pub mod store;

use crate::config::RateLimitConfig;
use crate::error::StoreError;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, error};

pub use self::redis_store::RedisStore;
pub use self::store::{MemoryStore, RateLimitRecord, RateLimitStore};

/// Bucket shared by every client whose address cannot be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Identifying metadata of an incoming request.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    /// Raw `X-Forwarded-For` header value
    pub forwarded_for: Option<String>,
    /// TCP peer address, when known
    pub peer_ip: Option<IpAddr>,
}

impl RequestMeta {
    pub fn from_ip(ip: IpAddr) -> Self {
        Self {
            forwarded_for: None,
            peer_ip: Some(ip),
        }
    }

    /// First `X-Forwarded-For` hop when it is an IP address, else the peer address.
    pub fn client_ip(&self) -> Option<IpAddr> {
        self.forwarded_for
            .as_deref()
            .and_then(|v| v.split(',').next())
            .and_then(|hop| hop.trim().parse().ok())
            .or(self.peer_ip)
    }
}

/// Maps request metadata to the partition key used for counting.
pub type KeyExtractor = Arc<dyn Fn(&RequestMeta) -> String + Send + Sync>;

/// Default extractor: `"<namespace>:<client-ip>"`, or `"<namespace>:unknown"`.
pub fn ip_key_extractor(namespace: impl Into<String>) -> KeyExtractor {
    let namespace = namespace.into();
    Arc::new(move |meta: &RequestMeta| {
        match meta.client_ip() {
            Some(ip) => format!("{namespace}:{ip}"),
            None => format!("{namespace}:{UNKNOWN_CLIENT}"),
        }
    })
}

/// Source of the current time in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Admission decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub admitted: bool,
    /// Requests left in the current window
    pub remaining: u32,
    /// Epoch milliseconds at which the window resets
    pub reset_at: i64,
    /// Seconds until the window resets, set only when rejected
    pub retry_after_secs: Option<u64>,
}

/// Thread-safe fixed-window rate limiter over a pluggable store.
pub struct RateLimiter {
    config: RateLimitConfig,
    store: Arc<dyn RateLimitStore>,
    key_extractor: KeyExtractor,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a limiter keyed by client IP within the configured namespace.
    pub fn new(config: RateLimitConfig, store: Arc<dyn RateLimitStore>) -> Self {
        let key_extractor = ip_key_extractor(config.namespace.clone());
        Self {
            config,
            store,
            key_extractor,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_key_extractor(mut self, key_extractor: KeyExtractor) -> Self {
        self.key_extractor = key_extractor;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub fn key_for(&self, meta: &RequestMeta) -> String {
        (self.key_extractor)(meta)
    }

    /// Count a request from `meta` and decide whether to admit it.
    pub async fn check(&self, meta: &RequestMeta) -> RateLimitDecision {
        let key = self.key_for(meta);
        self.check_key(&key).await
    }

    /// Count a request against an explicit key.
    pub async fn check_key(&self, key: &str) -> RateLimitDecision {
        let max = self.config.max_requests;
        let now = self.clock.now_ms();

        let record = match self.store.increment(key, self.config.window_ms, now).await {
            Ok(record) => record,
            Err(err) => {
                error!(%key, error = %err, "Rate limit store failed, admitting request");
                return RateLimitDecision {
                    admitted: true,
                    remaining: max,
                    reset_at: store::window_end(now, self.config.window_ms),
                    retry_after_secs: None,
                };
            }
        };

        let admitted = record.count <= max;
        let remaining = max.saturating_sub(record.count);
        let retry_after_secs = (!admitted).then(|| retry_after(record.window_reset_at, now));

        debug!(%key, count = record.count, remaining, admitted, "Rate limit checked");

        RateLimitDecision {
            admitted,
            remaining,
            reset_at: record.window_reset_at,
            retry_after_secs,
        }
    }

    /// Clear the record for `key`, unblocking it immediately.
    pub async fn reset(&self, key: &str) -> Result<(), StoreError> {
        self.store.reset(key).await
    }
}

/// Whole seconds until `reset_at`, never less than one.
fn retry_after(reset_at: i64, now: i64) -> u64 {
    let millis = reset_at.saturating_sub(now).max(0) as u64;
    millis.div_ceil(1000).max(1)
}
