//! Mapping of raw audit issues and agent findings into [`NormalizedProblem`].
//!
//! Every output field is resolved from an ordered list of candidate raw
//! fields kept in one [`RecordShape`] per source, so precedence lives in a
//! table rather than in scattered fallbacks.

use crate::location::parse_title_location;
use crate::models::{NormalizedProblem, RawRecord, Severity, SourceKind, Task};

/// Placeholder a backend uses for "no file".
const NO_FILE: &str = "-";

/// Field precedence for one source's record shape.
#[derive(Debug, Clone, Copy)]
pub struct RecordShape {
    /// Title used when the record has none
    pub untitled: &'static str,
    pub description: &'static [&'static str],
    pub category: &'static [&'static str],
    pub line_start: &'static [&'static str],
    pub line_end: &'static [&'static str],
    /// Recover location from the title when `file_path` is absent
    pub parse_title_location: bool,
}

/// Audit issue shape. Audit titles never embed a location.
pub const AUDIT_SHAPE: RecordShape = RecordShape {
    untitled: "(unnamed issue)",
    description: &[
        "description",
        "message",
        "ai_explanation",
        "suggestion",
        "code_snippet",
    ],
    category: &["issue_type"],
    line_start: &["line_number"],
    line_end: &[],
    parse_title_location: false,
};

/// Agent finding shape.
pub const AGENT_SHAPE: RecordShape = RecordShape {
    untitled: "(unnamed vulnerability)",
    description: &["description"],
    category: &["vulnerability_type"],
    line_start: &["line_start"],
    line_end: &["line_end"],
    parse_title_location: true,
};

impl RecordShape {
    /// Shape for a source kind.
    #[must_use]
    pub const fn for_kind(kind: SourceKind) -> &'static Self {
        match kind {
            SourceKind::Audit => &AUDIT_SHAPE,
            SourceKind::Agent => &AGENT_SHAPE,
        }
    }
}

/// Normalize one raw record fetched for `task`.
///
/// Never fails: missing or mistyped fields fall back to defaults.
#[must_use]
pub fn normalize_record(record: &RawRecord, task: &Task, kind: SourceKind) -> NormalizedProblem {
    let shape = RecordShape::for_kind(kind);

    let raw_title = record
        .text("title")
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| shape.untitled.to_string());

    let structured_path = record
        .text("file_path")
        .filter(|p| !p.is_empty() && p != NO_FILE);
    let structured_start = record.first_line(shape.line_start);
    let structured_end = record.first_line(shape.line_end);

    let parsed = if structured_path.is_none() && shape.parse_title_location {
        parse_title_location(&raw_title)
    } else {
        None
    };

    let (title, file_path, line_start, line_end) = match parsed {
        Some(loc) => (
            loc.remainder_title,
            Some(loc.file_path),
            structured_start.or(Some(loc.line_start)),
            structured_end.or(loc.line_end),
        ),
        None => (raw_title, structured_path, structured_start, structured_end),
    };
    let line_end = line_end.filter(|end| line_start.is_none_or(|start| *end >= start));

    NormalizedProblem {
        kind,
        id: record.text("id"),
        task_id: record.text("task_id").unwrap_or_else(|| task.id.clone()),
        task_created_at: task.created_at,
        created_at: record.timestamp("created_at"),
        severity: Severity::from_raw(record.text("severity").as_deref()),
        title,
        description: record.first_text(shape.description),
        file_path,
        line_start,
        line_end,
        category: record.first_text(shape.category),
    }
}

/// Normalize a whole batch fetched for `task`.
#[must_use]
pub fn normalize_batch(
    records: &[RawRecord],
    task: &Task,
    kind: SourceKind,
) -> Vec<NormalizedProblem> {
    records
        .iter()
        .map(|record| normalize_record(record, task, kind))
        .collect()
}
