//! Seam between the aggregation pipeline and the transport that serves
//! per-task results.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::{RawRecord, SourceKind};

/// Trait for backends that serve issues and findings for completed tasks.
#[async_trait]
pub trait ProblemSource: Send + Sync {
    /// Fetch the issues recorded by one audit task.
    async fn fetch_audit_issues(&self, task_id: &str) -> Result<Vec<RawRecord>, FetchError>;

    /// Fetch the findings recorded by one agent task.
    async fn fetch_agent_findings(&self, task_id: &str) -> Result<Vec<RawRecord>, FetchError>;

    /// Fetch results for a task of either kind.
    async fn fetch(&self, kind: SourceKind, task_id: &str) -> Result<Vec<RawRecord>, FetchError> {
        match kind {
            SourceKind::Audit => self.fetch_audit_issues(task_id).await,
            SourceKind::Agent => self.fetch_agent_findings(task_id).await,
        }
    }
}
