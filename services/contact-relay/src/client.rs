// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Client side of the contact form.
//!
//! [`ContactForm`] mirrors the form inputs and is checked with the same
//! rules the server applies. [`ContactClient`] posts it to `/contact` and
//! turns the reply into a [`SubmitOutcome`]; [`FormController`] tracks the
//! state the page renders (inline errors, banners).

use crate::submission::{Field, Submission};
use crate::validator;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::warn;
use url::Url;

/// How long the success banner stays up before the form resets.
pub const SUCCESS_BANNER_TTL: Duration = Duration::from_secs(5);

const UNKNOWN_ERROR: &str = "Something went wrong while sending the form. Please try again.";

/// Raw form inputs. Blank optional inputs are sent as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub project: String,
    pub budget: String,
    pub timeline: String,
    pub message: String,
}

impl ContactForm {
    /// Run the server's validation locally; on failure return the first message per field.
    pub fn check(&self) -> Result<Submission, BTreeMap<Field, String>> {
        let value = serde_json::to_value(self).unwrap_or_default();
        match validator::validate_value(&value) {
            Some(Ok(submission)) => Ok(submission),
            Some(Err(errors)) => Err(errors.first_per_field()),
            None => Err(BTreeMap::new()),
        }
    }
}

/// Interpreted server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted {
        message: String,
    },
    Invalid {
        error: String,
        details: Vec<String>,
        fields: BTreeMap<Field, Vec<String>>,
    },
    RateLimited {
        error: String,
        retry_after: Option<u64>,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Union of every reply body the endpoint produces.
#[derive(Debug, Default, Deserialize)]
struct Reply {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Vec<String>,
    #[serde(default)]
    fields: BTreeMap<String, Vec<String>>,
    #[serde(default, rename = "retryAfter")]
    retry_after: Option<u64>,
}

pub struct ContactClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl ContactClient {
    /// `base_url` is the site API root; the form posts to `<base_url>/contact`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    /// Like [`ContactClient::new`], reusing a configured HTTP client.
    pub fn with_http_client(base_url: &str, client: reqwest::Client) -> Result<Self, ClientError> {
        let base = Url::parse(base_url.trim_end_matches('/'))?;
        let endpoint = Url::parse(&format!("{}/contact", base.as_str().trim_end_matches('/')))?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn submit(&self, form: &ContactForm) -> Result<SubmitOutcome, ClientError> {
        let response = self.client.post(self.endpoint.clone()).json(form).send().await?;
        let status = response.status();
        let header_retry = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let reply: Reply = response.json().await.unwrap_or_default();

        Ok(interpret(status, header_retry, reply))
    }
}

fn interpret(status: StatusCode, header_retry: Option<u64>, reply: Reply) -> SubmitOutcome {
    let error = reply.error.unwrap_or_else(|| UNKNOWN_ERROR.to_string());
    match status {
        s if s.is_success() => SubmitOutcome::Accepted {
            message: reply.message.unwrap_or_default(),
        },
        StatusCode::BAD_REQUEST => SubmitOutcome::Invalid {
            error,
            details: reply.details,
            fields: reply
                .fields
                .into_iter()
                .filter_map(|(name, messages)| name.parse().ok().map(|f| (f, messages)))
                .collect(),
        },
        StatusCode::TOO_MANY_REQUESTS => SubmitOutcome::RateLimited {
            error,
            retry_after: reply.retry_after.or(header_retry),
        },
        _ => SubmitOutcome::Failed { error },
    }
}

/// What the form currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormStatus {
    Idle,
    Submitting,
    Submitted { since: Instant },
    Error(String),
}

/// Drives one form: local checks, submission, banners.
pub struct FormController {
    client: ContactClient,
    status: FormStatus,
    field_errors: BTreeMap<Field, String>,
}

impl FormController {
    pub fn new(client: ContactClient) -> Self {
        Self {
            client,
            status: FormStatus::Idle,
            field_errors: BTreeMap::new(),
        }
    }

    pub fn status(&self) -> &FormStatus {
        &self.status
    }

    /// Inline message for `field`, if any.
    pub fn field_error(&self, field: Field) -> Option<&str> {
        self.field_errors.get(&field).map(String::as_str)
    }

    pub fn field_errors(&self) -> &BTreeMap<Field, String> {
        &self.field_errors
    }

    /// Submit the form. Local validation failures never reach the network.
    pub async fn submit(&mut self, form: &ContactForm) -> &FormStatus {
        if let Err(errors) = form.check() {
            self.field_errors = errors;
            self.status = FormStatus::Idle;
            return &self.status;
        }

        self.field_errors.clear();
        self.status = FormStatus::Submitting;

        self.status = match self.client.submit(form).await {
            Ok(SubmitOutcome::Accepted { .. }) => FormStatus::Submitted {
                since: Instant::now(),
            },
            Ok(SubmitOutcome::Invalid { error, fields, .. }) => {
                self.field_errors = fields
                    .into_iter()
                    .filter_map(|(field, messages)| messages.into_iter().next().map(|m| (field, m)))
                    .collect();
                FormStatus::Error(error)
            }
            Ok(SubmitOutcome::RateLimited { error, retry_after }) => match retry_after {
                Some(secs) => FormStatus::Error(format!("{error} Retry in {secs} s.")),
                None => FormStatus::Error(error),
            },
            Ok(SubmitOutcome::Failed { error }) => FormStatus::Error(error),
            Err(err) => {
                warn!(error = %err, "Contact form submission failed");
                FormStatus::Error(UNKNOWN_ERROR.to_string())
            }
        };
        &self.status
    }

    /// Dismiss the success banner once it has been shown long enough.
    pub fn refresh(&mut self, now: Instant) {
        if let FormStatus::Submitted { since } = self.status {
            if now.duration_since(since) >= SUCCESS_BANNER_TTL {
                self.status = FormStatus::Idle;
            }
        }
    }
}
