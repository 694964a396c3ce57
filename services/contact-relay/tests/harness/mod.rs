// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test harness for the contact relay.
//!
//! Builds the real router over in-memory state and provides notifiers that
//! record or refuse deliveries, plus generators and metrics for abuse runs.

#![allow(dead_code)]

pub mod attacks;
pub mod generators;
pub mod metrics;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request},
    response::Response,
    Router,
};
use contact_relay::{
    config::{Config, RateLimitConfig},
    error::{NotifyError, StoreError},
    handlers::{router, AppState},
    limiter::{MemoryStore, RateLimitRecord, RateLimitStore, RateLimiter},
    metrics::Metrics,
    notifier::Notifier,
    pipeline::ContactPipeline,
    Submission,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

/// Keeps every submission it is handed.
#[derive(Default)]
pub struct RecordingNotifier {
    delivered: Mutex<Vec<Submission>>,
}

impl RecordingNotifier {
    pub fn delivered(&self) -> Vec<Submission> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, submission: &Submission) -> Result<(), NotifyError> {
        self.delivered.lock().unwrap().push(submission.clone());
        Ok(())
    }
}

/// Downstream that is always down.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _: &Submission) -> Result<(), NotifyError> {
        Err(NotifyError::Rejected { status: 502 })
    }
}

/// Counter store that cannot be reached.
pub struct UnreachableStore;

#[async_trait]
impl RateLimitStore for UnreachableStore {
    async fn increment(
        &self,
        _key: &str,
        _window_ms: u64,
        _now_ms: i64,
    ) -> Result<RateLimitRecord, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn reset(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
}

pub fn build_app_with_store(
    rate_limit: RateLimitConfig,
    store: Arc<dyn RateLimitStore>,
    notifier: Arc<dyn Notifier>,
) -> TestApp {
    let config = Config {
        rate_limit: rate_limit.clone(),
        ..Config::default()
    };
    let metrics = Arc::new(Metrics::new().unwrap());
    let pipeline = ContactPipeline::new(
        RateLimiter::new(rate_limit, store),
        notifier,
        Duration::from_secs(2),
    )
    .with_metrics(metrics.clone());

    let state = Arc::new(AppState {
        pipeline,
        metrics,
        config,
    });
    TestApp {
        router: router(state.clone()),
        state,
    }
}

pub fn build_app(rate_limit: RateLimitConfig, notifier: Arc<dyn Notifier>) -> TestApp {
    build_app_with_store(rate_limit, Arc::new(MemoryStore::new()), notifier)
}

/// POST a raw body to `/contact`, optionally as a forwarded client.
pub async fn post_contact(
    app: &Router,
    body: impl Into<Body>,
    client_ip: Option<&str>,
) -> Response {
    let mut request = Request::builder()
        .method("POST")
        .uri("/contact")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(ip) = client_ip {
        request = request.header("x-forwarded-for", ip);
    }
    app.clone()
        .oneshot(request.body(body.into()).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
