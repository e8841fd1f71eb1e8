//! Latest-problems aggregation for the code-audit dashboard.
//!
//! A project runs two families of analysis tasks: the traditional audit
//! pipeline, which reports *issues*, and the agent pipeline, which reports
//! *findings*. This crate fetches the results of the most recent completed
//! tasks of both families, normalizes the two record shapes into one
//! [`NormalizedProblem`], and produces a single ordered feed together with an
//! [`IssuesSummary`] describing how much was fetched.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use problems::{AggregationConfig, Aggregator, ApiClient};
//!
//! # async fn run() -> Result<(), problems::FetchError> {
//! let client = Arc::new(ApiClient::from_env()?);
//! let tasks = client.load_project_tasks("project-1").await;
//!
//! let aggregator = Aggregator::new(client, AggregationConfig::default());
//! let report = aggregator.aggregate(&tasks.audit, &tasks.agent).await;
//! println!("{} problems", report.problems.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! - `AUDIT_API_URL`: backend base URL (default `http://localhost:8000/api/v1`)
//! - `AUDIT_API_TOKEN`: bearer token sent with every request
//! - `PROBLEMS_MAX_TASKS`: completed tasks fetched per source (default 20)
//! - `PROBLEMS_FETCH_CONCURRENCY`: in-flight fetches per source (default 5)
//! - `PROBLEMS_REQUEST_TIMEOUT_MS`: per-task fetch budget (default 12000)
//!
//! # Architecture
//!
//! - [`select_tasks`] keeps completed tasks, newest first, under a cap
//! - [`map_with_concurrency`] fans fetches out over a fixed worker pool
//! - [`normalize_record`] maps raw records, using [`parse_title_location`]
//!   for agent findings without a structured location
//! - [`merge_problems`] orders the combined feed
//! - [`Aggregator`] wires everything behind the [`ProblemSource`] seam

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregate;
pub mod client;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod location;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod selector;
pub mod source;
pub mod stats;

pub use aggregate::{AggregationReport, Aggregator};
pub use client::{ApiClient, ProjectTasks};
pub use config::{AggregationConfig, ApiConfig};
pub use error::FetchError;
pub use fetcher::{map_with_concurrency, Settled};
pub use location::{parse_title_location, ParsedLocation};
pub use merge::{compare_problems, merge_problems};
pub use models::{
    IssuesSummary, NormalizedProblem, RawRecord, Severity, SourceKind, Task, TaskStatus,
};
pub use normalize::{normalize_batch, normalize_record, RecordShape};
pub use selector::{select_tasks, Selection};
pub use source::ProblemSource;
pub use stats::{unified_tasks, ProjectStats, UnifiedTask};
