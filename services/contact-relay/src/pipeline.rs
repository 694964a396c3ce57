// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! End-to-end handling of one contact submission.
//!
//! Steps run in order and short-circuit on the first failure:
//! rate limit, parse, validate, sanitize, notify.

use crate::error::{ContactError, NotifyError};
use crate::limiter::{RateLimitDecision, RateLimiter, RequestMeta};
use crate::metrics::Metrics;
use crate::notifier::Notifier;
use crate::sanitize::sanitize_submission;
use crate::submission::Submission;
use crate::validator;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

pub const ACCEPTED_MESSAGE: &str =
    "Your message has been sent. I will get back to you as soon as possible.";

/// A delivered submission.
#[derive(Debug, Clone)]
pub struct Accepted {
    pub message: &'static str,
    pub rate_limit: RateLimitDecision,
    pub submission: Submission,
}

pub struct ContactPipeline {
    limiter: RateLimiter,
    notifier: Arc<dyn Notifier>,
    notify_timeout: Duration,
    metrics: Option<Arc<Metrics>>,
}

impl ContactPipeline {
    pub fn new(limiter: RateLimiter, notifier: Arc<dyn Notifier>, notify_timeout: Duration) -> Self {
        Self {
            limiter,
            notifier,
            notify_timeout,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Handle one raw request body from the client described by `meta`.
    pub async fn handle(&self, raw_body: &[u8], meta: &RequestMeta) -> Result<Accepted, ContactError> {
        let result = self.run(raw_body, meta).await;
        if let Some(metrics) = &self.metrics {
            metrics.record_outcome(match &result {
                Ok(_) => "accepted",
                Err(err) => err.code(),
            });
        }
        result
    }

    async fn run(&self, raw_body: &[u8], meta: &RequestMeta) -> Result<Accepted, ContactError> {
        let decision = self.limiter.check(meta).await;
        if !decision.admitted {
            info!(
                client = ?meta.client_ip(),
                retry_after_secs = ?decision.retry_after_secs,
                "Contact request rate limited"
            );
            return Err(ContactError::RateLimited {
                retry_after_secs: decision.retry_after_secs,
                remaining: decision.remaining,
                reset_at: decision.reset_at,
            });
        }

        let body: serde_json::Value = serde_json::from_slice(raw_body).map_err(|err| {
            debug!(error = %err, "Unparseable contact body");
            ContactError::BadRequest("Request body must be valid JSON".to_string())
        })?;

        let validated = validator::validate_value(&body)
            .ok_or_else(|| ContactError::BadRequest("Request body must be a JSON object".to_string()))?
            .map_err(|errors| {
                info!(fields = %errors, "Contact request failed validation");
                ContactError::ValidationFailed(errors)
            })?;

        let submission = sanitize_submission(validated);
        debug!(
            name = %submission.name,
            email = %submission.email,
            budget = %submission.budget,
            timeline = %submission.timeline,
            client = ?meta.client_ip(),
            "Contact request accepted for delivery"
        );

        self.deliver(&submission).await?;

        Ok(Accepted {
            message: ACCEPTED_MESSAGE,
            rate_limit: decision,
            submission,
        })
    }

    /// Notify within the timeout; any failure becomes an opaque internal error.
    async fn deliver(&self, submission: &Submission) -> Result<(), ContactError> {
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.notify_timeout, self.notifier.notify(submission)).await;
        if let Some(metrics) = &self.metrics {
            metrics.observe_notify(started.elapsed().as_secs_f64());
        }

        let err = match outcome {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(err)) => err,
            Err(_) => NotifyError::TimedOut(self.notify_timeout),
        };
        error!(error = %err, "Contact notification failed, submission dropped");
        Err(ContactError::Internal(err.to_string()))
    }
}
