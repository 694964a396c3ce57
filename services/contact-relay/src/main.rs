// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Relay Service
//!
//! Receives contact form submissions from the portfolio site, rate limits
//! them per client IP, validates and sanitizes them, and hands them to a
//! notifier.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (a `.env` file is
//! honoured):
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `RATE_LIMIT_PRESET`: strict, moderate or lenient (default: strict)
//! - `RATE_LIMIT_WINDOW_MS` / `RATE_LIMIT_MAX_REQUESTS`: override the preset
//! - `RATE_LIMIT_BACKEND`: memory or redis (default: memory)
//! - `REDIS_URL`: Redis connection URL for the redis backend
//! - `NOTIFY_WEBHOOK_URL`: Where accepted submissions are posted
//! - `NOTIFY_TIMEOUT_MS`: Notification timeout (default: 10000)
//! - `ALLOWED_ORIGINS`: Comma-separated CORS origins
//! - `METRICS_ENABLED`: Expose `/metrics` (default: true)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contact_relay::{
    config::{Config, StoreBackend},
    handlers::{self, AppState},
    limiter::{Clock, MemoryStore, RateLimitStore, RateLimiter, RedisStore, SystemClock},
    metrics::Metrics,
    notifier::{LogNotifier, Notifier, WebhookNotifier},
    pipeline::ContactPipeline,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env();
    info!(
        bind_addr = %config.bind_addr,
        window_ms = config.rate_limit.window_ms,
        max_requests = config.rate_limit.max_requests,
        backend = ?config.rate_limit.backend,
        webhook = config.notifier.webhook_url.is_some(),
        "Starting contact relay"
    );

    let store = build_store(&config).await?;
    let notifier = build_notifier(&config)?;
    let metrics = Arc::new(Metrics::new()?);

    let limiter = RateLimiter::new(config.rate_limit.clone(), store);
    let pipeline = ContactPipeline::new(limiter, notifier, config.notifier.timeout())
        .with_metrics(metrics.clone());

    let state = Arc::new(AppState {
        pipeline,
        metrics,
        config: config.clone(),
    });
    let app = handlers::router(state);

    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn RateLimitStore>> {
    match config.rate_limit.backend {
        StoreBackend::Redis => {
            let store = RedisStore::connect(&config.rate_limit.redis_url).await?;
            info!("Rate limit counters stored in Redis");
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            let store = Arc::new(MemoryStore::new());

            // Spawn purge task
            let purge_store = store.clone();
            let every = config.rate_limit.purge_interval();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(every);
                loop {
                    interval.tick().await;
                    purge_store.purge_expired(SystemClock.now_ms()).await;
                }
            });

            Ok(store)
        }
    }
}

fn build_notifier(config: &Config) -> anyhow::Result<Arc<dyn Notifier>> {
    match &config.notifier.webhook_url {
        Some(url) => {
            let notifier = WebhookNotifier::new(url)?;
            info!(url = %notifier.url(), "Submissions delivered to webhook");
            Ok(Arc::new(notifier))
        }
        None => {
            warn!("NOTIFY_WEBHOOK_URL not set, submissions will only be logged");
            Ok(Arc::new(LogNotifier::new()))
        }
    }
}
