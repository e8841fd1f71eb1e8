//! Completed-task selection and capping per source.

use std::cmp::Reverse;

use crate::models::Task;

/// Tasks chosen for fetching from one source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Completed tasks, most recent first, at most `max_tasks` long
    pub tasks: Vec<Task>,
    /// Completed tasks that existed before the cap
    pub completed_count: usize,
}

impl Selection {
    /// Whether the cap dropped any completed task.
    #[must_use]
    pub fn is_limited(&self) -> bool {
        self.completed_count > self.tasks.len()
    }
}

/// Keep completed tasks, newest first, capped at `max_tasks`.
///
/// Ties and tasks without `created_at` keep their input order; the latter
/// sort after every dated task.
#[must_use]
pub fn select_tasks(tasks: &[Task], max_tasks: usize) -> Selection {
    let mut completed: Vec<Task> = tasks.iter().filter(|t| t.is_completed()).cloned().collect();
    completed.sort_by_key(|t| Reverse(t.created_at));

    let completed_count = completed.len();
    completed.truncate(max_tasks);

    Selection {
        tasks: completed,
        completed_count,
    }
}
