// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the contact relay.
//!
//! Defaults match the strict contact-form policy: 5 submissions per
//! client per minute, in-process counters, notifications logged only.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Configuration for the contact relay service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Outbound notification configuration
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Allowed browser origins
    #[serde(default)]
    pub cors: CorsConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Where rate-limit counters live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process map; counts are not shared between instances.
    Memory,
    /// Shared Redis instance, for multi-instance deployments.
    Redis,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(format!("unknown rate limit backend: {other}")),
        }
    }
}

/// Fixed-window rate limiting policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Length of the counting window in milliseconds (default: 60000)
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Requests admitted per key per window (default: 5)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Prefix for rate limit keys (default: contact-form)
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Counter storage (default: memory)
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,

    /// Redis connection URL, used with the redis backend
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// How often expired in-memory records are purged, in seconds (default: 60)
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
}

/// Outbound notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Webhook receiving sanitized submissions; logged only when absent
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Upper bound on one notification attempt in milliseconds (default: 10000)
    #[serde(default = "default_notify_timeout_ms")]
    pub timeout_ms: u64,
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed to post the form (default: https://localhost)
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_window_ms() -> u64 {
    60_000
}

fn default_max_requests() -> u32 {
    5
}

fn default_namespace() -> String {
    "contact-form".to_string()
}

fn default_backend() -> StoreBackend {
    StoreBackend::Memory
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_purge_interval_secs() -> u64 {
    60
}

fn default_notify_timeout_ms() -> u64 {
    10_000
}

fn default_allowed_origins() -> Vec<String> {
    vec!["https://localhost".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

/// Longest accepted counting window: one day.
pub const MAX_WINDOW_MS: u64 = 86_400_000;

/// Paths the router serves itself; the metrics endpoint may not shadow them.
const RESERVED_PATHS: [&str; 3] = ["/contact", "/health", "/healthz"];

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            rate_limit: RateLimitConfig::default(),
            notifier: NotifierConfig::default(),
            cors: CorsConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::strict()
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_ms: default_notify_timeout_ms(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl RateLimitConfig {
    fn preset(max_requests: u32) -> Self {
        Self {
            window_ms: default_window_ms(),
            max_requests,
            namespace: default_namespace(),
            backend: default_backend(),
            redis_url: default_redis_url(),
            purge_interval_secs: default_purge_interval_secs(),
        }
    }

    /// 5 requests per minute; the contact form default.
    pub fn strict() -> Self {
        Self::preset(5)
    }

    /// 20 requests per minute.
    pub fn moderate() -> Self {
        Self::preset(20)
    }

    /// 100 requests per minute.
    pub fn lenient() -> Self {
        Self::preset(100)
    }

    pub fn from_preset(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "strict" => Some(Self::strict()),
            "moderate" => Some(Self::moderate()),
            "lenient" => Some(Self::lenient()),
            _ => None,
        }
    }

    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }
}

impl NotifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Parse an optional setting, keeping the default when it is malformed.
fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> T {
    parse_where(lookup, name, default, |_| true)
}

/// Like [`parse_or`], but a parsed value must also pass `accept`.
fn parse_where<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
    accept: impl Fn(&T) -> bool,
) -> T {
    match lookup(name) {
        Some(raw) => match raw.trim().parse() {
            Ok(v) if accept(&v) => v,
            Ok(_) => {
                warn!(setting = name, value = %raw, "Ignoring out-of-range setting");
                default
            }
            Err(_) => {
                warn!(setting = name, value = %raw, "Ignoring malformed setting");
                default
            }
        },
        None => default,
    }
}

fn is_routable_metrics_path(path: &str) -> bool {
    path.starts_with('/') && path.len() > 1 && !RESERVED_PATHS.contains(&path)
}

impl Config {
    /// Load configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();

        let mut rate_limit = match lookup("RATE_LIMIT_PRESET") {
            Some(name) => RateLimitConfig::from_preset(&name).unwrap_or_else(|| {
                warn!(preset = %name, "Unknown rate limit preset, using strict");
                RateLimitConfig::strict()
            }),
            None => RateLimitConfig::default(),
        };
        rate_limit.window_ms = parse_where(
            &lookup,
            "RATE_LIMIT_WINDOW_MS",
            rate_limit.window_ms,
            |ms| (1..=MAX_WINDOW_MS).contains(ms),
        );
        rate_limit.max_requests =
            parse_or(&lookup, "RATE_LIMIT_MAX_REQUESTS", rate_limit.max_requests);
        rate_limit.backend = parse_or(&lookup, "RATE_LIMIT_BACKEND", rate_limit.backend);
        rate_limit.purge_interval_secs = parse_where(
            &lookup,
            "RATE_LIMIT_PURGE_SECS",
            rate_limit.purge_interval_secs,
            |secs| *secs > 0,
        );
        if let Some(namespace) = lookup("RATE_LIMIT_NAMESPACE") {
            rate_limit.namespace = namespace;
        }
        if let Some(url) = lookup("REDIS_URL") {
            rate_limit.redis_url = url;
        }

        let notifier = NotifierConfig {
            webhook_url: lookup("NOTIFY_WEBHOOK_URL").filter(|u| !u.trim().is_empty()),
            timeout_ms: parse_or(&lookup, "NOTIFY_TIMEOUT_MS", defaults.notifier.timeout_ms),
        };

        let cors = match lookup("ALLOWED_ORIGINS") {
            Some(origins) => CorsConfig {
                allowed_origins: origins
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect(),
            },
            None => defaults.cors,
        };

        let metrics = MetricsConfig {
            enabled: parse_or(&lookup, "METRICS_ENABLED", defaults.metrics.enabled),
            path: parse_where(
                &lookup,
                "METRICS_PATH",
                defaults.metrics.path,
                |path: &String| is_routable_metrics_path(path),
            ),
        };

        Config {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            rate_limit,
            notifier,
            cors,
            metrics,
        }
    }
}
