//! Project overview numbers and the combined task list.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::models::{SourceKind, Task};

/// Headline numbers for a project across both task families.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectStats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    /// Sum of reported issue and finding counts
    pub total_issues: u64,
    /// Mean quality score over all tasks, missing scores count as 0
    pub avg_quality_score: f64,
}

impl ProjectStats {
    #[must_use]
    pub fn from_tasks(audit: &[Task], agent: &[Task]) -> Self {
        let total_tasks = audit.len() + agent.len();
        let completed_tasks = audit
            .iter()
            .chain(agent)
            .filter(|t| t.is_completed())
            .count();
        let total_issues = audit
            .iter()
            .map(|t| t.issues_count.unwrap_or(0))
            .chain(agent.iter().map(|t| t.findings_count.unwrap_or(0)))
            .sum();
        let avg_quality_score = if total_tasks > 0 {
            audit
                .iter()
                .chain(agent)
                .map(|t| t.quality_score.unwrap_or(0.0))
                .sum::<f64>()
                / total_tasks as f64
        } else {
            0.0
        };

        Self {
            total_tasks,
            completed_tasks,
            total_issues,
            avg_quality_score,
        }
    }
}

/// A task tagged with the family it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedTask {
    pub kind: SourceKind,
    pub task: Task,
}

/// Every task of both kinds, newest first.
#[must_use]
pub fn unified_tasks(audit: &[Task], agent: &[Task]) -> Vec<UnifiedTask> {
    let mut merged: Vec<UnifiedTask> = audit
        .iter()
        .map(|task| UnifiedTask {
            kind: SourceKind::Audit,
            task: task.clone(),
        })
        .chain(agent.iter().map(|task| UnifiedTask {
            kind: SourceKind::Agent,
            task: task.clone(),
        }))
        .collect();
    merged.sort_by_key(|t| Reverse(t.task.created_at));
    merged
}
