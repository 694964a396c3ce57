// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics owned by the application state.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder,
};

pub struct Metrics {
    registry: Registry,
    submissions: IntCounterVec,
    notify_seconds: Histogram,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let submissions = IntCounterVec::new(
            Opts::new(
                "contact_submissions_total",
                "Contact form submissions by outcome",
            ),
            &["outcome"],
        )?;
        let notify_seconds = Histogram::with_opts(HistogramOpts::new(
            "contact_notify_duration_seconds",
            "Time spent delivering accepted submissions",
        ))?;

        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(notify_seconds.clone()))?;

        Ok(Self {
            registry,
            submissions,
            notify_seconds,
        })
    }

    pub fn record_outcome(&self, outcome: &str) {
        self.submissions.with_label_values(&[outcome]).inc();
    }

    pub fn observe_notify(&self, seconds: f64) {
        self.notify_seconds.observe(seconds);
    }

    pub fn outcome_count(&self, outcome: &str) -> u64 {
        self.submissions.with_label_values(&[outcome]).get()
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
