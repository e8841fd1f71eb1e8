//! Configuration for the aggregation pipeline and the API client.

use std::env;
use std::time::Duration;

/// Default API base URL for a local backend.
const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// Most recent completed tasks fetched per source.
pub const DEFAULT_MAX_TASKS: usize = 20;

/// Worker-pool width per source.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 5;

/// Per-request budget before a slot is marked failed.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 12_000;

/// Aggregation limits.
#[derive(Debug, Clone)]
pub struct AggregationConfig {
    /// Cap on completed tasks fetched per source.
    pub max_tasks: usize,
    /// Maximum in-flight fetches per source.
    pub concurrency: usize,
    /// Timeout applied to every single fetch.
    pub request_timeout: Duration,
}

impl AggregationConfig {
    /// Create a config with explicit values, ignoring the environment.
    #[must_use]
    pub const fn new(max_tasks: usize, concurrency: usize, request_timeout: Duration) -> Self {
        Self {
            max_tasks,
            concurrency,
            request_timeout,
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_tasks: env::var("PROBLEMS_MAX_TASKS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_TASKS),
            concurrency: env::var("PROBLEMS_FETCH_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_FETCH_CONCURRENCY),
            request_timeout: Duration::from_millis(
                env::var("PROBLEMS_REQUEST_TIMEOUT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
            ),
        }
    }
}

/// Connection settings for the audit backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://localhost:8000/api/v1`.
    pub base_url: String,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    /// Transport-level timeout in seconds.
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Create a config pointing at `base_url` without a token.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout_secs: 30,
        }
    }

    /// Attach a bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: env::var("AUDIT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            token: env::var("AUDIT_API_TOKEN").ok().filter(|s| !s.is_empty()),
            timeout_secs: env::var("AUDIT_API_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}
