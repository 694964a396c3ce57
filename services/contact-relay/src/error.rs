// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the contact relay.

use crate::submission::FieldErrors;
use axum::{
    http::{header::RETRY_AFTER, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

pub const RATE_LIMITED_MESSAGE: &str = "Too many requests. Please try again later.";
pub const VALIDATION_MESSAGE: &str = "Validation failed";
pub const INTERNAL_MESSAGE: &str = "An internal server error occurred. Please try again later.";

pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Outcome of a contact request that did not end in delivery.
#[derive(Debug, Error)]
pub enum ContactError {
    #[error("Malformed request body: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(FieldErrors),

    #[error("Rate limit exceeded, reset at {reset_at}")]
    RateLimited {
        retry_after_secs: Option<u64>,
        remaining: u32,
        reset_at: i64,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Rate-limit store failure. Never surfaced to callers: the limiter fails open.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Outbound notification failure.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Notification rejected with status {status}")]
    Rejected { status: u16 },

    #[error("Notification timed out after {0:?}")]
    TimedOut(Duration),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl ErrorResponse {
    fn message(error: &str) -> Self {
        Self {
            error: error.to_string(),
            details: None,
            fields: None,
            retry_after: None,
        }
    }
}

impl ContactError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used in logs and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::ValidationFailed(_) => "validation_failed",
            Self::RateLimited { .. } => "rate_limited",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ContactError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::BadRequest(reason) => {
                let body = ErrorResponse {
                    error: reason,
                    details: Some(Vec::new()),
                    ..ErrorResponse::message("")
                };
                (status, Json(body)).into_response()
            }
            Self::ValidationFailed(errors) => {
                let body = ErrorResponse {
                    error: VALIDATION_MESSAGE.to_string(),
                    details: Some(errors.messages()),
                    fields: Some(errors),
                    retry_after: None,
                };
                (status, Json(body)).into_response()
            }
            Self::RateLimited {
                retry_after_secs,
                remaining,
                reset_at,
            } => {
                let body = ErrorResponse {
                    retry_after: retry_after_secs,
                    ..ErrorResponse::message(RATE_LIMITED_MESSAGE)
                };
                let mut response = (status, Json(body)).into_response();
                let headers = response.headers_mut();
                headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
                headers.insert(X_RATELIMIT_RESET, HeaderValue::from(reset_at));
                headers.insert(RETRY_AFTER, HeaderValue::from(retry_after_secs.unwrap_or(60)));
                response
            }
            // Never echo internal detail back to the caller.
            Self::Internal(_) => {
                (status, Json(ErrorResponse::message(INTERNAL_MESSAGE))).into_response()
            }
        }
    }
}
