// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Redis-backed counters shared by every relay instance.

use super::store::{RateLimitRecord, RateLimitStore};
use crate::error::StoreError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use redis::aio::MultiplexedConnection;
use redis::Script;
use tracing::info;

/// INCR and window expiry in one atomic step; returns `{count, pttl}`.
static INCREMENT_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
local ttl = redis.call('PTTL', KEYS[1])
if ttl < 0 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
    ttl = tonumber(ARGV[1])
end
return {count, ttl}
",
    )
});

pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_tokio_connection().await?;
        info!("Connected to Redis rate limit store");
        Ok(Self { conn })
    }
}

#[async_trait]
impl RateLimitStore for RedisStore {
    async fn increment(
        &self,
        key: &str,
        window_ms: u64,
        now_ms: i64,
    ) -> Result<RateLimitRecord, StoreError> {
        let mut conn = self.conn.clone();
        let (count, ttl_ms): (i64, i64) = INCREMENT_SCRIPT
            .key(key)
            .arg(window_ms)
            .invoke_async(&mut conn)
            .await?;

        Ok(RateLimitRecord {
            count: u32::try_from(count).unwrap_or(u32::MAX),
            window_reset_at: now_ms + ttl_ms.max(0),
        })
    }

    async fn reset(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("DEL")
            .arg(key)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}
