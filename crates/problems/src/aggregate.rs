//! Aggregation of the latest problems across both task families.
//!
//! One run selects the most recent completed tasks per source, fetches
//! their results through two bounded pools running side by side, normalizes
//! every batch that arrived, and merges everything into one feed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AggregationConfig;
use crate::fetcher::map_with_concurrency;
use crate::merge::merge_problems;
use crate::models::{IssuesSummary, NormalizedProblem, SourceKind, Task};
use crate::normalize::normalize_batch;
use crate::selector::select_tasks;
use crate::source::ProblemSource;

/// Result of one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationReport {
    /// Merged problems in feed order
    pub problems: Vec<NormalizedProblem>,
    pub summary: IssuesSummary,
}

/// Problems collected from one source.
struct SourceBatch {
    problems: Vec<NormalizedProblem>,
    failed: usize,
}

/// Fetches, normalizes and merges per-task results.
///
/// Holds no state between runs, so repeated calls with the same inputs and
/// the same backend data produce the same report.
pub struct Aggregator {
    source: Arc<dyn ProblemSource>,
    config: AggregationConfig,
}

impl Aggregator {
    /// Create an aggregator over `source`.
    #[must_use]
    pub fn new(source: Arc<dyn ProblemSource>, config: AggregationConfig) -> Self {
        Self { source, config }
    }

    #[must_use]
    pub const fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Aggregate the latest problems for one project's task lists.
    ///
    /// Per-task failures and timeouts only drop that task's records; they
    /// are counted in the summary and never fail the run.
    pub async fn aggregate(
        &self,
        audit_tasks: &[Task],
        agent_tasks: &[Task],
    ) -> AggregationReport {
        let max_tasks = self.config.max_tasks;
        let audit = select_tasks(audit_tasks, max_tasks);
        let agent = select_tasks(agent_tasks, max_tasks);

        let mut summary = IssuesSummary {
            completed_audit_tasks: audit.completed_count,
            completed_agent_tasks: agent.completed_count,
            fetched_audit_tasks: audit.tasks.len(),
            fetched_agent_tasks: agent.tasks.len(),
            failed_audit_tasks: 0,
            failed_agent_tasks: 0,
            is_limited: audit.is_limited() || agent.is_limited(),
            max_tasks,
        };

        if audit.tasks.is_empty() && agent.tasks.is_empty() {
            debug!("No completed tasks to fetch");
            return AggregationReport {
                problems: Vec::new(),
                summary,
            };
        }

        let (audit_batch, agent_batch) = tokio::join!(
            self.collect(SourceKind::Audit, &audit.tasks),
            self.collect(SourceKind::Agent, &agent.tasks)
        );

        summary.failed_audit_tasks = audit_batch.failed;
        summary.failed_agent_tasks = agent_batch.failed;
        let problems = merge_problems(audit_batch.problems, agent_batch.problems);

        info!(
            problems = problems.len(),
            audit_tasks = summary.fetched_audit_tasks,
            agent_tasks = summary.fetched_agent_tasks,
            failed_audit_tasks = summary.failed_audit_tasks,
            failed_agent_tasks = summary.failed_agent_tasks,
            is_limited = summary.is_limited,
            "Aggregated latest problems"
        );

        AggregationReport { problems, summary }
    }

    /// Fetch and normalize results for one source's selected tasks.
    async fn collect(&self, kind: SourceKind, tasks: &[Task]) -> SourceBatch {
        let source = &self.source;
        let results = map_with_concurrency(
            tasks,
            self.config.concurrency,
            self.config.request_timeout,
            |task| source.fetch(kind, &task.id),
        )
        .await;

        let mut batch = SourceBatch {
            problems: Vec::new(),
            failed: 0,
        };
        for (task, result) in tasks.iter().zip(results) {
            match result {
                Ok(records) => {
                    debug!(
                        source = kind.as_str(),
                        task_id = %task.id,
                        records = records.len(),
                        "Fetched task results"
                    );
                    batch.problems.extend(normalize_batch(&records, task, kind));
                }
                Err(e) => {
                    batch.failed += 1;
                    warn!(
                        source = kind.as_str(),
                        task_id = %task.id,
                        timed_out = e.is_timeout(),
                        error = %e,
                        "Failed to fetch task results"
                    );
                }
            }
        }
        batch
    }
}
