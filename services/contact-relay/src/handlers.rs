// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the contact relay service.

use crate::config::Config;
use crate::error::{X_RATELIMIT_REMAINING, X_RATELIMIT_RESET};
use crate::limiter::RequestMeta;
use crate::metrics::Metrics;
use crate::pipeline::ContactPipeline;
use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

/// Shared application state.
pub struct AppState {
    pub pipeline: ContactPipeline,
    pub metrics: Arc<Metrics>,
    pub config: Config,
}

/// Success response body.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "contact-relay",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn request_meta(headers: &HeaderMap, peer: Option<SocketAddr>) -> RequestMeta {
    RequestMeta {
        forwarded_for: headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        peer_ip: peer.map(|addr| addr.ip()),
    }
}

/// Accept a contact form submission.
pub async fn contact(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let meta = request_meta(&headers, connect_info.map(|ConnectInfo(addr)| addr));

    match state.pipeline.handle(&body, &meta).await {
        Ok(accepted) => {
            let mut response = (
                StatusCode::OK,
                Json(SuccessResponse {
                    success: true,
                    message: accepted.message.to_string(),
                }),
            )
                .into_response();
            let headers = response.headers_mut();
            headers.insert(
                X_RATELIMIT_REMAINING,
                HeaderValue::from(accepted.rate_limit.remaining),
            );
            headers.insert(X_RATELIMIT_RESET, HeaderValue::from(accepted.rate_limit.reset_at));
            response
        }
        Err(err) => err.into_response(),
    }
}

/// Prometheus scrape endpoint.
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Skipping invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([X_RATELIMIT_REMAINING, X_RATELIMIT_RESET, header::RETRY_AFTER])
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/contact", post(contact));

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics_handler));
    }

    app.layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_meta_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        let meta = request_meta(&headers, Some("10.0.0.2:5555".parse().unwrap()));
        assert_eq!(meta.client_ip(), Some("203.0.113.9".parse().unwrap()));

        let meta = request_meta(&HeaderMap::new(), Some("10.0.0.2:5555".parse().unwrap()));
        assert_eq!(meta.client_ip(), Some("10.0.0.2".parse().unwrap()));

        let meta = request_meta(&HeaderMap::new(), None);
        assert_eq!(meta.client_ip(), None);
    }
}
