// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outcome tally for abuse runs.

use axum::http::StatusCode;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::{Duration, Instant};

/// How the endpoint answered one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Accepted,
    Invalid,
    BadRequest,
    RateLimited,
    Failed,
}

impl Outcome {
    /// Classify a reply; 400s carrying a `fields` map are validation failures.
    pub fn classify(status: StatusCode, body: &serde_json::Value) -> Self {
        match status {
            StatusCode::OK => Self::Accepted,
            StatusCode::BAD_REQUEST if body.get("fields").is_some() => Self::Invalid,
            StatusCode::BAD_REQUEST => Self::BadRequest,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            _ => Self::Failed,
        }
    }
}

pub struct AttackMetrics {
    started: Instant,
    elapsed: Option<Duration>,
    tally: HashMap<Outcome, usize>,
    clients: HashSet<String>,
    slowest: Duration,
}

impl AttackMetrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            elapsed: None,
            tally: HashMap::new(),
            clients: HashSet::new(),
            slowest: Duration::ZERO,
        }
    }

    pub fn finish(&mut self) {
        self.elapsed = Some(self.started.elapsed());
    }

    pub fn record(&mut self, outcome: Outcome, client: &str, latency: Duration) {
        *self.tally.entry(outcome).or_default() += 1;
        self.clients.insert(client.to_string());
        self.slowest = self.slowest.max(latency);
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.tally.get(&outcome).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.tally.values().sum()
    }

    /// Requests that got past the limiter, whatever happened next.
    pub fn admitted(&self) -> usize {
        self.total() - self.count(Outcome::RateLimited)
    }

    pub fn report(&self) -> MetricsReport {
        let total = self.total();
        let rate_limited = self.count(Outcome::RateLimited);
        MetricsReport {
            total_requests: total,
            accepted: self.count(Outcome::Accepted),
            invalid: self.count(Outcome::Invalid),
            bad_request: self.count(Outcome::BadRequest),
            rate_limited,
            failed: self.count(Outcome::Failed),
            block_rate: if total == 0 {
                0.0
            } else {
                rate_limited as f64 / total as f64
            },
            unique_clients: self.clients.len(),
            slowest: self.slowest,
            elapsed: self.elapsed.unwrap_or_else(|| self.started.elapsed()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsReport {
    pub total_requests: usize,
    pub accepted: usize,
    pub invalid: usize,
    pub bad_request: usize,
    pub rate_limited: usize,
    pub failed: usize,
    /// Share of requests turned away by the limiter.
    pub block_rate: f64,
    pub unique_clients: usize,
    pub slowest: Duration,
    pub elapsed: Duration,
}

impl fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} requests from {} clients in {:?} (slowest {:?})",
            self.total_requests, self.unique_clients, self.elapsed, self.slowest
        )?;
        write!(
            f,
            "accepted={} invalid={} bad_request={} rate_limited={} failed={} blocked={:.1}%",
            self.accepted,
            self.invalid,
            self.bad_request,
            self.rate_limited,
            self.failed,
            self.block_rate * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify() {
        assert_eq!(Outcome::classify(StatusCode::OK, &json!({})), Outcome::Accepted);
        assert_eq!(
            Outcome::classify(StatusCode::BAD_REQUEST, &json!({ "fields": {} })),
            Outcome::Invalid
        );
        assert_eq!(
            Outcome::classify(StatusCode::BAD_REQUEST, &json!({ "error": "x" })),
            Outcome::BadRequest
        );
        assert_eq!(
            Outcome::classify(StatusCode::INTERNAL_SERVER_ERROR, &json!({})),
            Outcome::Failed
        );
    }

    #[test]
    fn test_report() {
        let mut metrics = AttackMetrics::new();
        for _ in 0..3 {
            metrics.record(Outcome::Accepted, "10.0.0.1", Duration::from_micros(10));
        }
        for _ in 0..7 {
            metrics.record(Outcome::RateLimited, "10.0.0.2", Duration::from_micros(40));
        }
        metrics.finish();

        let report = metrics.report();
        assert!((report.block_rate - 0.7).abs() < 0.01);
        assert_eq!(metrics.admitted(), 3);
        assert_eq!(report.unique_clients, 2);
        assert_eq!(report.slowest, Duration::from_micros(40));
    }
}
