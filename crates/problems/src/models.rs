//! Data model shared by the aggregation pipeline.
//!
//! [`Task`] and [`RawRecord`] come from the backend and are only read here.
//! [`NormalizedProblem`] and [`IssuesSummary`] are produced fresh on every
//! aggregation run.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Which analysis pipeline a task or problem belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Traditional audit pipeline ("issues")
    Audit,
    /// Agent pipeline ("findings")
    Agent,
}

impl SourceKind {
    /// Get display name for this source.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Audit => "audit",
            Self::Agent => "agent",
        }
    }
}

/// Lifecycle status of an analysis task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    /// Any status string this crate does not know about
    #[serde(other)]
    Unknown,
}

/// One analysis run as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Issue count reported by audit tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues_count: Option<u64>,
    /// Finding count reported by agent tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub findings_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
}

impl Task {
    /// Create a task with only the fields the pipeline needs.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        status: TaskStatus,
        created_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: id.into(),
            status,
            created_at,
            completed_at: None,
            issues_count: None,
            findings_count: None,
            quality_score: None,
        }
    }

    /// Whether the task finished and its results can be fetched.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// One loosely typed issue or finding exactly as the backend returned it.
///
/// Anything that is not a JSON object decodes to an empty record, so a
/// malformed element only degrades to defaults in the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct RawRecord(Map<String, Value>);

impl From<Value> for RawRecord {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl RawRecord {
    /// Raw access to a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Field rendered as text; `null` and missing fields are `None`.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<String> {
        match self.0.get(field)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    /// First field in `fields` that holds a non-null value.
    #[must_use]
    pub fn first_text(&self, fields: &[&str]) -> Option<String> {
        fields.iter().find_map(|field| self.text(field))
    }

    /// Field as a positive line number.
    ///
    /// Accepts JSON integers, integral floats and numeric strings.
    #[must_use]
    pub fn line(&self, field: &str) -> Option<u32> {
        let line = match self.0.get(field)? {
            Value::Number(n) => match n.as_u64() {
                Some(v) => u32::try_from(v).ok(),
                None => n
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && *f > 0.0 && *f <= f64::from(u32::MAX))
                    .map(|f| f as u32),
            },
            Value::String(s) => s.trim().parse::<u32>().ok(),
            _ => None,
        }?;
        (line > 0).then_some(line)
    }

    /// First field in `fields` that holds a positive line number.
    #[must_use]
    pub fn first_line(&self, fields: &[&str]) -> Option<u32> {
        fields.iter().find_map(|field| self.line(field))
    }

    /// Field parsed as a timestamp.
    #[must_use]
    pub fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        self.0.get(field)?.as_str().and_then(parse_timestamp)
    }
}

/// Canonical problem severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Map a raw severity value; anything unrecognized becomes `Low`.
    #[must_use]
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.unwrap_or_default().to_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" => Self::Medium,
            _ => Self::Low,
        }
    }

    /// Sort rank, higher is more severe.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Critical => 4,
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// A single issue or finding in the unified shape shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedProblem {
    pub kind: SourceKind,
    pub id: Option<String>,
    pub task_id: String,
    pub task_created_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub severity: Severity,
    pub title: String,
    pub description: Option<String>,
    pub file_path: Option<String>,
    pub line_start: Option<u32>,
    pub line_end: Option<u32>,
    pub category: Option<String>,
}

impl NormalizedProblem {
    /// `path:start[-end]`, or `None` when no file is known.
    #[must_use]
    pub fn location(&self) -> Option<String> {
        let path = self.file_path.as_deref()?;
        Some(match (self.line_start, self.line_end) {
            (Some(start), Some(end)) if end != start => format!("{path}:{start}-{end}"),
            (Some(start), _) => format!("{path}:{start}"),
            (None, _) => path.to_string(),
        })
    }
}

/// How much of each source was fetched versus how much exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuesSummary {
    pub completed_audit_tasks: usize,
    pub completed_agent_tasks: usize,
    /// Audit tasks whose results were requested
    pub fetched_audit_tasks: usize,
    /// Agent tasks whose results were requested
    pub fetched_agent_tasks: usize,
    /// Requested audit tasks that failed or timed out
    pub failed_audit_tasks: usize,
    /// Requested agent tasks that failed or timed out
    pub failed_agent_tasks: usize,
    pub is_limited: bool,
    pub max_tasks: usize,
}

/// Parse a backend timestamp.
///
/// Accepts RFC 3339 and naive `YYYY-MM-DD[T ]HH:MM:SS[.f]`, which is taken as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_str).and_then(parse_timestamp))
}

fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}
