// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Relay
//!
//! Server side of the portfolio site's contact form:
//!
//! - Fixed-window rate limiting per client IP (5 per minute default)
//! - Total validation of the submission, reporting every violated rule
//! - Sanitization of free-text fields before delivery
//! - Delivery to a webhook (or the log) under a timeout
//! - A small client for posting the form and interpreting replies

pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod notifier;
pub mod pipeline;
pub mod sanitize;
pub mod submission;
pub mod validator;

pub use config::Config;
pub use error::ContactError;
pub use limiter::{RateLimitDecision, RateLimiter, RequestMeta};
pub use pipeline::{Accepted, ContactPipeline};
pub use submission::{Budget, Field, FieldErrors, Submission, Timeline};
