//! Combined-feed ordering.
//!
//! Freshest finding first, most severe first among same-instant findings,
//! then the most recently created task first.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::models::NormalizedProblem;

/// Missing timestamps sort as the Unix epoch.
fn sort_key(ts: Option<DateTime<Utc>>) -> DateTime<Utc> {
    ts.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Descending feed order. Exact ties compare equal.
#[must_use]
pub fn compare_problems(a: &NormalizedProblem, b: &NormalizedProblem) -> Ordering {
    sort_key(b.created_at)
        .cmp(&sort_key(a.created_at))
        .then_with(|| b.severity.rank().cmp(&a.severity.rank()))
        .then_with(|| sort_key(b.task_created_at).cmp(&sort_key(a.task_created_at)))
}

/// Concatenate audit then agent problems and sort them into feed order.
///
/// The sort is stable, so exact ties keep audit-before-agent and their
/// per-source order.
#[must_use]
pub fn merge_problems(
    audit: Vec<NormalizedProblem>,
    agent: Vec<NormalizedProblem>,
) -> Vec<NormalizedProblem> {
    let mut merged = audit;
    merged.extend(agent);
    merged.sort_by(compare_problems);
    merged
}
