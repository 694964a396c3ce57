// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Counter storage for the fixed-window rate limiter.

use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Counter state for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRecord {
    /// Requests observed in the current window, this one included
    pub count: u32,
    /// Epoch milliseconds at which the window expires
    pub window_reset_at: i64,
}

/// End of a window opened at `now_ms`, saturating instead of wrapping.
pub(crate) fn window_end(now_ms: i64, window_ms: u64) -> i64 {
    now_ms.saturating_add(i64::try_from(window_ms).unwrap_or(i64::MAX))
}

impl RateLimitRecord {
    fn fresh(window_ms: u64, now_ms: i64) -> Self {
        Self {
            count: 1,
            window_reset_at: window_end(now_ms, window_ms),
        }
    }

    /// Expired records are treated as absent.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms > self.window_reset_at
    }
}

/// Backing store for rate-limit counters.
///
/// `increment` must be atomic per key: two concurrent calls for the same
/// key never observe the same count.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Count one request for `key`, opening a new window if none is active.
    async fn increment(
        &self,
        key: &str,
        window_ms: u64,
        now_ms: i64,
    ) -> Result<RateLimitRecord, StoreError>;

    /// Forget the record for `key`.
    async fn reset(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process counters. Correct for a single instance only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, RateLimitRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop records whose window has already closed.
    pub async fn purge_expired(&self, now_ms: i64) -> usize {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now_ms));
        let purged = before - records.len();
        if purged > 0 {
            debug!(purged, "Purged expired rate limit records");
        }
        purged
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RateLimitStore for MemoryStore {
    async fn increment(
        &self,
        key: &str,
        window_ms: u64,
        now_ms: i64,
    ) -> Result<RateLimitRecord, StoreError> {
        // Read-increment-write under a single write guard.
        let mut records = self.records.write().await;
        let record = records
            .entry(key.to_string())
            .and_modify(|record| {
                if record.is_expired(now_ms) {
                    *record = RateLimitRecord::fresh(window_ms, now_ms);
                } else {
                    record.count = record.count.saturating_add(1);
                }
            })
            .or_insert_with(|| RateLimitRecord::fresh(window_ms, now_ms));
        Ok(*record)
    }

    async fn reset(&self, key: &str) -> Result<(), StoreError> {
        self.records.write().await.remove(key);
        Ok(())
    }
}
