// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outbound delivery of accepted submissions.
//!
//! Each submission gets exactly one delivery attempt. There is no outbox
//! or retry, so a failed notification loses the submission.

use crate::error::NotifyError;
use crate::submission::Submission;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Sink for sanitized submissions.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, submission: &Submission) -> Result<(), NotifyError>;
}

/// Logs submissions instead of sending them. Used when no webhook is configured.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
    delay: Duration,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate provider latency.
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, submission: &Submission) -> Result<(), NotifyError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        debug!(name = %submission.name, email = %submission.email, "Contact request content");
        info!(
            budget = %submission.budget,
            timeline = %submission.timeline,
            "Contact request recorded (no webhook configured)"
        );
        Ok(())
    }
}

/// Payload posted to the webhook.
#[derive(Debug, Serialize)]
pub struct NotificationPayload<'a> {
    pub subject: String,
    pub submission: &'a Submission,
    pub received_at: DateTime<Utc>,
}

impl<'a> NotificationPayload<'a> {
    pub fn new(submission: &'a Submission) -> Self {
        Self {
            subject: format!("New project request from {}", submission.name),
            submission,
            received_at: Utc::now(),
        }
    }
}

/// Posts submissions as JSON to an HTTP endpoint (mail relay, chat hook, ...).
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: Url,
}

impl WebhookNotifier {
    pub fn new(url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            client: reqwest::Client::new(),
            url: Url::parse(url)?,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, submission: &Submission) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&NotificationPayload::new(submission))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!(status = status.as_u16(), "Contact request delivered");
            Ok(())
        } else {
            Err(NotifyError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}
